use hyper::Method;
use serde_json::Value;

use crate::error::OptimizerError;
use crate::http::send;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
  pub api_key: String,
  pub model: String,
  pub api_base_url: String,
}

impl GeminiConfig {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      api_key: api_key.into(),
      model: DEFAULT_MODEL.to_string(),
      api_base_url: DEFAULT_API_BASE_URL.to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
  pub temperature: f64,
  pub top_p: f64,
  pub max_output_tokens: u32,
  pub json_output: bool,
}

impl Default for GenerationParams {
  fn default() -> Self {
    Self {
      temperature: 0.7,
      top_p: 0.9,
      max_output_tokens: 800,
      json_output: true,
    }
  }
}

fn model_path(model: &str) -> String {
  let m = model.trim();
  if m.starts_with("models/") {
    m.to_string()
  } else {
    format!("models/{m}")
  }
}

fn build_url(cfg: &GeminiConfig, method: &str) -> Result<String, OptimizerError> {
  let base = cfg.api_base_url.trim_end_matches('/');
  let model = model_path(&cfg.model);
  let mut url = url::Url::parse(&format!("{base}/{model}:{method}"))
    .map_err(|e| OptimizerError::InvalidRequest(format!("invalid Gemini base url: {e}")))?;
  url.query_pairs_mut().append_pair("key", &cfg.api_key);
  Ok(url.to_string())
}

fn build_request_json(parts: &[String], params: GenerationParams) -> Value {
  let parts: Vec<Value> = parts
    .iter()
    .map(|text| serde_json::json!({"text": text}))
    .collect();

  let mut generation_config = serde_json::json!({
    "temperature": params.temperature,
    "topP": params.top_p,
    "maxOutputTokens": params.max_output_tokens,
  });
  if params.json_output {
    generation_config["responseMimeType"] = Value::String("application/json".to_string());
  }

  serde_json::json!({
    "contents": [{"role": "user", "parts": parts}],
    "generationConfig": generation_config,
  })
}

fn extract_text_from_response_json(json: &Value) -> String {
  let mut out = String::new();
  let candidates = json
    .get("candidates")
    .and_then(|v| v.as_array())
    .cloned()
    .unwrap_or_default();
  // Only the first candidate is used; we never ask for more than one.
  if let Some(cand) = candidates.first() {
    let parts = cand
      .get("content")
      .and_then(|v| v.get("parts"))
      .and_then(|v| v.as_array())
      .cloned()
      .unwrap_or_default();
    for part in parts {
      if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
        out.push_str(text);
      }
    }
  }
  out
}

/// Calls `generateContent` with one user turn made of `parts` and returns the
/// text of the first candidate (empty if the model returned none).
pub async fn generate_content(
  cfg: &GeminiConfig,
  parts: &[String],
  params: GenerationParams,
) -> Result<String, OptimizerError> {
  let url = build_url(cfg, "generateContent")?;
  let payload = build_request_json(parts, params);
  let body = serde_json::to_vec(&payload).map_err(|e| OptimizerError::InvalidRequest(e.to_string()))?;

  tracing::debug!(model = %cfg.model, parts = parts.len(), "calling Gemini generateContent");
  let resp = send(Method::POST, &url, Some(body)).await?;

  if !resp.is_success() {
    return Err(OptimizerError::Upstream {
      service: "Gemini",
      status: resp.status.as_u16(),
      body: resp.body_text(),
    });
  }

  let json: Value = serde_json::from_slice(&resp.body).map_err(|e| OptimizerError::InvalidJson(e.to_string()))?;
  Ok(extract_text_from_response_json(&json))
}
