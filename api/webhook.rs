use std::sync::Arc;

use http_body_util::BodyExt;
use vercel_runtime::{run, service_fn, Error, Request, Response, ResponseBody};

use ad_creative_optimizer::config::ServiceConfig;
use ad_creative_optimizer::error::OptimizerError;
use ad_creative_optimizer::handler::{handle_body_result, WEBHOOK};
use ad_creative_optimizer::telemetry::init_tracing;

async fn handler(req: Request, cfg: Arc<ServiceConfig>) -> Result<Response<ResponseBody>, Error> {
  let method = req.method().clone();
  let headers = req.headers().clone();
  let body = req
    .into_body()
    .collect()
    .await
    .map(|collected| collected.to_bytes())
    .map_err(OptimizerError::transport);
  handle_body_result(&cfg, &WEBHOOK, &method, &headers, body).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
  init_tracing();
  let cfg = Arc::new(ServiceConfig::from_env());
  run(service_fn(move |req| handler(req, cfg.clone()))).await
}
