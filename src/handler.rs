use bytes::Bytes;
use hyper::header::HeaderValue;
use hyper::{HeaderMap, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use vercel_runtime::{Error, Response, ResponseBody};

use crate::config::ServiceConfig;
use crate::copywriter::{generate_variations, BrandContext, GeneratedVariation, DEFAULT_VARIANTS, MAX_VARIANTS};
use crate::error::OptimizerError;
use crate::insights::{derive_insights, Insights};
use crate::providers::facebook::{fetch_creative_metrics, FacebookCredentials, FetchOptions};
use crate::scoring::{safe_number, score_and_rank, CreativeMetric, ScoredCreative};

pub const SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  Facebook,
  Custom,
}

/// Creatives substituted when a request ends up with an empty batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleBatch {
  /// Three creatives spanning strong to weak performance.
  Full,
  /// Only the strongest sample creative.
  Single,
}

/// What distinguishes one endpoint from the other.
#[derive(Debug, Clone, Copy)]
pub struct EndpointProfile {
  pub name: &'static str,
  pub ready_message: &'static str,
  pub default_source: Source,
  pub requires_secret: bool,
  pub sample: SampleBatch,
}

pub const ANALYZE: EndpointProfile = EndpointProfile {
  name: "analyze",
  ready_message: "Ad Creative Optimizer ready",
  default_source: Source::Facebook,
  requires_secret: false,
  sample: SampleBatch::Full,
};

pub const WEBHOOK: EndpointProfile = EndpointProfile {
  name: "webhook",
  ready_message: "Webhook ready",
  default_source: Source::Custom,
  requires_secret: true,
  sample: SampleBatch::Single,
};

fn sample_creative(
  id: &str,
  headline: &str,
  primary_text: &str,
  cta: &str,
  [impressions, clicks, ctr, cpc, conversions, cost_per_conversion, roas]: [f64; 7],
) -> CreativeMetric {
  CreativeMetric {
    id: id.to_string(),
    headline: headline.to_string(),
    primary_text: primary_text.to_string(),
    cta: cta.to_string(),
    impressions,
    clicks,
    ctr,
    cpc,
    conversions,
    cost_per_conversion,
    roas,
    ..CreativeMetric::default()
  }
}

pub fn sample_creatives(batch: SampleBatch) -> Vec<CreativeMetric> {
  let mut out = vec![sample_creative(
    "S1",
    "Save 30% Today",
    "Upgrade your workflow in minutes",
    "Shop Now",
    [12000.0, 420.0, 0.035, 0.45, 38.0, 5.2, 2.4],
  )];
  if batch == SampleBatch::Full {
    out.push(sample_creative(
      "S2",
      "All-in-One Toolkit",
      "Everything you need to launch",
      "Get Started",
      [8000.0, 80.0, 0.01, 1.2, 5.0, 19.0, 0.9],
    ));
    out.push(sample_creative(
      "S3",
      "Trusted by 10,000+ teams",
      "Ship faster with fewer bugs",
      "Try Free",
      [15000.0, 150.0, 0.01, 1.0, 10.0, 15.0, 1.2],
    ));
  }
  out
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeRequest {
  pub source: Source,
  /// `Some` only when the body carried a `creativeMetrics` array.
  pub creative_metrics: Option<Vec<CreativeMetric>>,
  pub brand: BrandContext,
  pub num_variants: usize,
  pub facebook: FacebookCredentials,
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
  value
    .and_then(|v| v.as_str())
    .filter(|s| !s.is_empty())
    .map(|s| s.to_string())
}

fn parse_num_variants(value: Option<&Value>) -> usize {
  match value {
    None => DEFAULT_VARIANTS,
    Some(v) => (safe_number(v).floor().max(0.0) as usize).min(MAX_VARIANTS),
  }
}

impl AnalyzeRequest {
  /// Reads a request body leniently: wrong-typed fields fall back to defaults
  /// instead of failing the request.
  pub fn from_json(body: &Value, default_source: Source) -> Self {
    // The profile default applies only when the field is absent; `null` or
    // any other value selects custom.
    let source = match body.get("source") {
      None => default_source,
      Some(Value::String(s)) if s == "facebook" => Source::Facebook,
      Some(_) => Source::Custom,
    };

    let creative_metrics = body
      .get("creativeMetrics")
      .and_then(|v| v.as_array())
      .map(|items| items.iter().map(CreativeMetric::from_json).collect());

    let brand = body
      .get("brand")
      .map(BrandContext::from_json)
      .unwrap_or_default();

    let fb = body.get("facebook");
    let facebook = FacebookCredentials {
      access_token: non_empty_str(fb.and_then(|v| v.get("accessToken"))),
      ad_account_id: non_empty_str(fb.and_then(|v| v.get("adAccountId"))),
    };

    Self {
      source,
      creative_metrics,
      brand,
      num_variants: parse_num_variants(body.get("numVariants")),
      facebook,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
  pub top_creatives: Vec<ScoredCreative>,
  pub bottom_creatives: Vec<ScoredCreative>,
  pub insights: Insights,
  pub variations: Vec<GeneratedVariation>,
  pub total_creatives: usize,
}

async fn collect_creatives(
  cfg: &ServiceConfig,
  profile: &EndpointProfile,
  req: &AnalyzeRequest,
) -> Result<Vec<CreativeMetric>, OptimizerError> {
  let mut creatives = match (&req.creative_metrics, req.source) {
    (Some(supplied), _) => supplied.clone(),
    (None, Source::Facebook) => {
      let creds = req.facebook.clone().or(&cfg.facebook.credentials);
      let fetched = fetch_creative_metrics(&cfg.facebook.api_base_url, &creds, &FetchOptions::default()).await?;
      if let Some(note) = &fetched.note {
        tracing::warn!(endpoint = profile.name, %note, "Facebook fetch skipped");
      }
      fetched.creative_metrics
    }
    (None, Source::Custom) => vec![],
  };

  if creatives.is_empty() {
    tracing::info!(endpoint = profile.name, sample = ?profile.sample, "empty batch; using sample creatives");
    creatives = sample_creatives(profile.sample);
  }
  Ok(creatives)
}

/// Score, rank, summarize and write copy for one request.
pub async fn run_analysis(
  cfg: &ServiceConfig,
  profile: &EndpointProfile,
  req: &AnalyzeRequest,
) -> Result<AnalysisSummary, OptimizerError> {
  let creatives = collect_creatives(cfg, profile, req).await?;
  let ranked = score_and_rank(creatives);
  let report = derive_insights(&ranked);

  let generation = generate_variations(&cfg.copy, &req.brand, &report.insights, req.num_variants).await?;

  tracing::info!(
    endpoint = profile.name,
    total = ranked.len(),
    variations = generation.variations.len(),
    "analysis complete"
  );

  Ok(AnalysisSummary {
    top_creatives: report.top,
    bottom_creatives: report.bottom,
    insights: generation.insights.unwrap_or(report.insights),
    variations: generation.variations,
    total_creatives: ranked.len(),
  })
}

const CORS_HEADERS: [(&str, &str); 3] = [
  ("access-control-allow-origin", "*"),
  ("access-control-allow-methods", "GET,POST,OPTIONS"),
  ("access-control-allow-headers", "Content-Type, X-Webhook-Secret"),
];

fn with_cors(mut response: Response<ResponseBody>) -> Response<ResponseBody> {
  let headers = response.headers_mut();
  for (name, value) in CORS_HEADERS {
    headers.insert(name, HeaderValue::from_static(value));
  }
  response
}

fn json_response(status: StatusCode, value: Value) -> Result<Response<ResponseBody>, Error> {
  Ok(with_cors(
    Response::builder()
      .status(status)
      .header("content-type", "application/json; charset=utf-8")
      .body(ResponseBody::from(value))?,
  ))
}

fn empty_response(status: StatusCode) -> Result<Response<ResponseBody>, Error> {
  Ok(with_cors(
    Response::builder()
      .status(status)
      .body(ResponseBody::from(String::new()))?,
  ))
}

fn error_message(err: &OptimizerError) -> String {
  let msg = err.to_string();
  if msg.trim().is_empty() {
    "Internal error".to_string()
  } else {
    msg
  }
}

fn parse_body(body: &Bytes) -> Result<Value, OptimizerError> {
  if body.iter().all(|b| b.is_ascii_whitespace()) {
    return Ok(Value::Object(Default::default()));
  }
  serde_json::from_slice::<Value>(body)
    .map_err(|e| OptimizerError::InvalidRequest(format!("invalid json body: {e}")))
}

fn secret_matches(cfg: &ServiceConfig, headers: &HeaderMap) -> bool {
  let Some(expected) = cfg.webhook_secret.as_deref() else {
    return true;
  };
  let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
  provided == Some(expected)
}

/// Full request lifecycle shared by both endpoints.
pub async fn handle(
  cfg: &ServiceConfig,
  profile: &EndpointProfile,
  method: &Method,
  headers: &HeaderMap,
  body: Bytes,
) -> Result<Response<ResponseBody>, Error> {
  tracing::debug!(endpoint = profile.name, %method, "request");

  if method == Method::OPTIONS {
    return empty_response(StatusCode::OK);
  }
  if method == Method::GET {
    return json_response(
      StatusCode::OK,
      serde_json::json!({"ok": true, "message": profile.ready_message}),
    );
  }
  if method != Method::POST {
    return json_response(
      StatusCode::METHOD_NOT_ALLOWED,
      serde_json::json!({"error": "Method not allowed"}),
    );
  }

  if profile.requires_secret && !secret_matches(cfg, headers) {
    tracing::warn!(endpoint = profile.name, "rejected request with invalid webhook secret");
    return json_response(
      StatusCode::UNAUTHORIZED,
      serde_json::json!({"error": "Invalid webhook secret"}),
    );
  }

  let result = match parse_body(&body) {
    Ok(value) => {
      let req = AnalyzeRequest::from_json(&value, profile.default_source);
      run_analysis(cfg, profile, &req).await
    }
    Err(err) => Err(err),
  };

  match result {
    Ok(summary) => json_response(StatusCode::OK, serde_json::to_value(&summary)?),
    Err(err) => {
      tracing::error!(endpoint = profile.name, error = %err, "analysis failed");
      json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({"error": error_message(&err)}),
      )
    }
  }
}

/// Like [`handle`], for callers whose body read can fail. A failed read is
/// answered with the same 500 `{error}` shape as a failed analysis.
pub async fn handle_body_result(
  cfg: &ServiceConfig,
  profile: &EndpointProfile,
  method: &Method,
  headers: &HeaderMap,
  body: Result<Bytes, OptimizerError>,
) -> Result<Response<ResponseBody>, Error> {
  match body {
    Ok(bytes) => handle(cfg, profile, method, headers, bytes).await,
    Err(err) => {
      tracing::error!(endpoint = profile.name, error = %err, "failed to read request body");
      json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({"error": error_message(&err)}),
      )
    }
  }
}
