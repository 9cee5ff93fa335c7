use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "ad_creative_optimizer=info,analyze=info,webhook=info";

/// Installs the JSON log subscriber. `RUST_LOG` overrides the default filter.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
    .json()
    .try_init();
}
