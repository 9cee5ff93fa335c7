use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

const KNOWN_FIELDS: &[&str] = &[
  "id",
  "name",
  "headline",
  "primaryText",
  "description",
  "cta",
  "imageUrl",
  "impressions",
  "clicks",
  "ctr",
  "cpc",
  "conversions",
  "costPerConversion",
  "roas",
  "score",
];

/// Coerces a JSON value to a finite number, falling back to 0.
///
/// Numeric strings parse after trimming, booleans count as 1/0, `null` and
/// empty strings are 0. Anything non-finite or unparseable is 0.
pub fn safe_number(value: &Value) -> f64 {
  let n = match value {
    Value::Number(n) => n.as_f64().unwrap_or(0.0),
    Value::String(s) => {
      let s = s.trim();
      if s.is_empty() {
        0.0
      } else {
        s.parse::<f64>().unwrap_or(0.0)
      }
    }
    Value::Bool(true) => 1.0,
    _ => 0.0,
  };
  finite_or_zero(n)
}

fn safe_number_opt(value: Option<&Value>) -> f64 {
  value.map(safe_number).unwrap_or(0.0)
}

fn finite_or_zero(n: f64) -> f64 {
  if n.is_finite() {
    n
  } else {
    0.0
  }
}

/// Lenient text coercion: `null` or missing is empty, other scalars are stringified.
pub(crate) fn text(value: Option<&Value>) -> String {
  match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
  }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
  match value {
    None | Some(Value::Null) => None,
    v => Some(text(v)),
  }
}

// Whole numbers go out as integers so `impressions: 12000` round-trips as-is.
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
  if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
    serializer.serialize_i64(*value as i64)
  } else {
    serializer.serialize_f64(*value)
  }
}

/// Observed performance of one advertising creative.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeMetric {
  pub id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  pub headline: String,
  pub primary_text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub cta: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(serialize_with = "serialize_number")]
  pub impressions: f64,
  #[serde(serialize_with = "serialize_number")]
  pub clicks: f64,
  #[serde(serialize_with = "serialize_number")]
  pub ctr: f64,
  #[serde(serialize_with = "serialize_number")]
  pub cpc: f64,
  #[serde(serialize_with = "serialize_number")]
  pub conversions: f64,
  #[serde(serialize_with = "serialize_number")]
  pub cost_per_conversion: f64,
  #[serde(serialize_with = "serialize_number")]
  pub roas: f64,
  /// Caller-supplied fields this service does not interpret, echoed back untouched.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl CreativeMetric {
  /// Builds a metric from loosely-typed JSON. Never fails: non-object input
  /// yields an all-default metric, malformed numbers become 0.
  pub fn from_json(value: &Value) -> Self {
    let Some(obj) = value.as_object() else {
      return Self::default();
    };

    let extra = obj
      .iter()
      .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
      .map(|(k, v)| (k.clone(), v.clone()))
      .collect();

    Self {
      id: text(obj.get("id")),
      name: optional_text(obj.get("name")),
      headline: text(obj.get("headline")),
      primary_text: text(obj.get("primaryText")),
      description: optional_text(obj.get("description")),
      cta: text(obj.get("cta")),
      image_url: optional_text(obj.get("imageUrl")),
      impressions: safe_number_opt(obj.get("impressions")),
      clicks: safe_number_opt(obj.get("clicks")),
      ctr: safe_number_opt(obj.get("ctr")),
      cpc: safe_number_opt(obj.get("cpc")),
      conversions: safe_number_opt(obj.get("conversions")),
      cost_per_conversion: safe_number_opt(obj.get("costPerConversion")),
      roas: safe_number_opt(obj.get("roas")),
      extra,
    }
  }
}

/// A creative annotated with its computed quality score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCreative {
  #[serde(flatten)]
  pub metric: CreativeMetric,
  pub score: f64,
}

/// Weighted composite score. Rewards engagement, conversions and return,
/// rewards low cost per click/conversion, and gives log credit for reach.
pub fn compute_creative_score(m: &CreativeMetric) -> f64 {
  let ctr = finite_or_zero(m.ctr);
  let cpc = finite_or_zero(m.cpc);
  let conversions = finite_or_zero(m.conversions);
  let cost_per_conv = finite_or_zero(m.cost_per_conversion);
  let roas = finite_or_zero(m.roas);
  let impressions = finite_or_zero(m.impressions).max(0.0);

  let ctr_score = ctr * 100.0;
  let cpc_score = if cpc > 0.0 { 50.0 / cpc } else { 0.0 };
  let conv_score = conversions * 5.0;
  let cost_conv_score = if cost_per_conv > 0.0 {
    50.0 / cost_per_conv
  } else {
    0.0
  };
  let roas_score = roas * 20.0;
  let imp_score = (impressions + 1.0).log10() * 10.0;

  saturate(ctr_score + cpc_score + conv_score + cost_conv_score + roas_score + imp_score)
}

fn saturate(total: f64) -> f64 {
  if total.is_nan() {
    0.0
  } else if total.is_infinite() {
    f64::MAX.copysign(total)
  } else {
    total
  }
}

/// Scores every creative and sorts by score descending. Ties keep input order.
pub fn score_and_rank(metrics: Vec<CreativeMetric>) -> Vec<ScoredCreative> {
  let mut scored: Vec<ScoredCreative> = metrics
    .into_iter()
    .map(|metric| {
      let score = compute_creative_score(&metric);
      ScoredCreative { metric, score }
    })
    .collect();
  scored.sort_by(|a, b| b.score.total_cmp(&a.score));
  scored
}
