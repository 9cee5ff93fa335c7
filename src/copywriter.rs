use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OptimizerError;
use crate::insights::Insights;
use crate::providers::gemini::{generate_content, GeminiConfig, GenerationParams};
use crate::scoring::text;

pub const DEFAULT_VARIANTS: usize = 3;
/// Upper bound on a requested count; only guards against absurd allocations.
pub const MAX_VARIANTS: usize = 10_000;

const HOOKS: [&str; 3] = ["Save time today", "Built for results", "Trusted by teams"];

/// How ad copy gets written. Chosen from configuration, not per request.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyStrategy {
  /// Deterministic templates; needs no credentials.
  Template,
  Gemini(GeminiConfig),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandContext {
  pub name: Option<String>,
  pub voice: Option<String>,
  pub audience: Option<String>,
  pub product: Option<String>,
}

impl BrandContext {
  pub fn from_json(value: &Value) -> Self {
    let field = |key: &str| match value.get(key) {
      Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
      Some(v @ Value::Number(_)) | Some(v @ Value::Bool(true)) => Some(v.to_string()),
      _ => None,
    };
    Self {
      name: field("name"),
      voice: field("voice"),
      audience: field("audience"),
      product: field("product"),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedVariation {
  pub headline: String,
  pub primary_text: String,
  pub description: String,
  pub cta: String,
}

impl GeneratedVariation {
  /// Reads one model-written variation. Wrong-typed fields are stringified
  /// and anything that is not an object yields empty fields.
  pub fn from_json(value: &Value) -> Self {
    Self {
      headline: text(value.get("headline")),
      primary_text: text(value.get("primaryText")),
      description: text(value.get("description")),
      cta: text(value.get("cta")),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
  pub variations: Vec<GeneratedVariation>,
  /// Insights as rewritten by the model; `None` means keep the computed ones.
  pub insights: Option<Insights>,
}

fn template_variations(brand: &BrandContext, num_variants: usize) -> Vec<GeneratedVariation> {
  let name = brand.name.as_deref().unwrap_or("Your Brand");
  let product = brand.product.as_deref().unwrap_or("your product");
  let audience = brand.audience.as_deref().unwrap_or("busy people");

  (0..num_variants)
    .map(|i| GeneratedVariation {
      headline: format!("{} with {name}", HOOKS[i % HOOKS.len()]),
      primary_text: format!("Meet {product} - designed for {audience} to get more done in less time."),
      description: "Start today and see measurable impact within weeks.".to_string(),
      cta: "Learn More".to_string(),
    })
    .collect()
}

fn build_prompt_parts(brand: &BrandContext, insights: &Insights, num_variants: usize) -> Result<Vec<String>, OptimizerError> {
  let insights_json = serde_json::to_string(insights).map_err(|e| OptimizerError::InvalidRequest(e.to_string()))?;
  let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();

  Ok(vec![
    format!(
      "You are an expert performance ad copywriter. Analyze the provided brand context and insights and produce {num_variants} high-converting ad copy variations. Output strictly valid JSON with the schema: {{\"variations\":[{{\"headline\":\"\",\"primaryText\":\"\",\"description\":\"\",\"cta\":\"\"}}], \"insights\":{{\"whatWorked\":[],\"whatDidntWork\":[],\"guidelines\":[]}}}}. Avoid any extra commentary."
    ),
    format!("Brand: {}", or_empty(&brand.name)),
    format!("Voice: {}", or_empty(&brand.voice)),
    format!("Audience: {}", or_empty(&brand.audience)),
    format!("Product: {}", or_empty(&brand.product)),
    format!("Insights: {insights_json}"),
  ])
}

fn normalize_model_json_text(raw: &str) -> String {
  let mut text = raw.trim().to_string();
  if !text.starts_with("```") {
    return text;
  }

  if let Some(first_nl) = text.find('\n') {
    text = text[(first_nl + 1)..].to_string();
  }
  if let Some(end_fence) = text.rfind("```") {
    text = text[..end_fence].to_string();
  }
  text.trim().to_string()
}

fn parse_model_json(raw: &str) -> Option<Value> {
  let normalized = normalize_model_json_text(raw);
  if normalized.is_empty() {
    return None;
  }
  serde_json::from_str::<Value>(&normalized).ok()
}

fn parse_generation(raw: &str, num_variants: usize) -> Generation {
  let Some(parsed) = parse_model_json(raw) else {
    tracing::warn!(output_len = raw.len(), "model output was not valid JSON; returning no variations");
    return Generation {
      variations: vec![],
      insights: None,
    };
  };

  let variations = parsed
    .get("variations")
    .and_then(|v| v.as_array())
    .map(|items| {
      items
        .iter()
        .take(num_variants)
        .map(GeneratedVariation::from_json)
        .collect()
    })
    .unwrap_or_default();

  let insights = parsed
    .get("insights")
    .and_then(|v| serde_json::from_value::<Insights>(v.clone()).ok());

  Generation { variations, insights }
}

/// Produces up to `num_variants` ad copy variations informed by `insights`.
///
/// The template strategy always yields exactly `num_variants`; the Gemini
/// strategy truncates what the model returns and never pads.
pub async fn generate_variations(
  strategy: &CopyStrategy,
  brand: &BrandContext,
  insights: &Insights,
  num_variants: usize,
) -> Result<Generation, OptimizerError> {
  match strategy {
    CopyStrategy::Template => Ok(Generation {
      variations: template_variations(brand, num_variants),
      insights: Some(insights.clone()),
    }),
    CopyStrategy::Gemini(cfg) => {
      let parts = build_prompt_parts(brand, insights, num_variants)?;
      let text = generate_content(cfg, &parts, GenerationParams::default()).await?;
      Ok(parse_generation(&text, num_variants))
    }
  }
}
