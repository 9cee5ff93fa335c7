use thiserror::Error;

/// Failures surfaced by the library modules. Binaries box these into
/// `vercel_runtime::Error` at the handler boundary.
#[derive(Debug, Error)]
pub enum OptimizerError {
  /// A third-party API answered with a non-success status.
  #[error("{service} error (status {status}): {body}")]
  Upstream {
    service: &'static str,
    status: u16,
    body: String,
  },

  #[error("transport error: {0}")]
  Transport(String),

  #[error("invalid json response: {0}")]
  InvalidJson(String),

  #[error("invalid request: {0}")]
  InvalidRequest(String),
}

impl OptimizerError {
  pub fn transport(err: impl std::fmt::Display) -> Self {
    Self::Transport(err.to_string())
  }
}
