use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Method, Request, StatusCode};

use crate::error::OptimizerError;

pub struct RawResponse {
  pub status: StatusCode,
  pub body: Bytes,
}

impl RawResponse {
  pub fn is_success(&self) -> bool {
    self.status.is_success()
  }

  pub fn body_text(&self) -> String {
    String::from_utf8_lossy(&self.body).to_string()
  }
}

/// Sends one request over a fresh HTTPS-or-HTTP client and buffers the body.
///
/// Status is not interpreted here; callers decide what counts as failure.
pub async fn send(method: Method, url: &str, json_body: Option<Vec<u8>>) -> Result<RawResponse, OptimizerError> {
  let connector = hyper_rustls::HttpsConnectorBuilder::new()
    .with_native_roots()
    .map_err(OptimizerError::transport)?
    .https_or_http()
    .enable_http1()
    .build();
  let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
    .build(connector);

  let mut builder = Request::builder()
    .method(method)
    .uri(url)
    .header(ACCEPT, "application/json");
  if json_body.is_some() {
    builder = builder.header(CONTENT_TYPE, "application/json");
  }
  let req = builder
    .body(Full::new(Bytes::from(json_body.unwrap_or_default())))
    .map_err(OptimizerError::transport)?;

  let resp = client.request(req).await.map_err(OptimizerError::transport)?;

  let status = resp.status();
  let body = resp
    .into_body()
    .collect()
    .await
    .map_err(OptimizerError::transport)?
    .to_bytes();

  Ok(RawResponse { status, body })
}
