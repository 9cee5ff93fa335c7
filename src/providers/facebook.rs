use hyper::Method;
use serde_json::Value;

use crate::error::OptimizerError;
use crate::http::send;
use crate::scoring::{safe_number, CreativeMetric};

pub const DEFAULT_API_BASE_URL: &str = "https://graph.facebook.com/v19.0";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacebookCredentials {
  pub access_token: Option<String>,
  pub ad_account_id: Option<String>,
}

impl FacebookCredentials {
  /// Field-by-field merge: values present here win, gaps are filled from `fallback`.
  pub fn or(self, fallback: &FacebookCredentials) -> Self {
    Self {
      access_token: self.access_token.or_else(|| fallback.access_token.clone()),
      ad_account_id: self.ad_account_id.or_else(|| fallback.ad_account_id.clone()),
    }
  }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
  pub date_preset: String,
  pub limit: u32,
}

impl Default for FetchOptions {
  fn default() -> Self {
    Self {
      date_preset: "last_30d".to_string(),
      limit: 200,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct FacebookFetch {
  pub creative_metrics: Vec<CreativeMetric>,
  pub note: Option<String>,
}

fn normalize_account_id(raw: &str) -> String {
  let id = raw.trim();
  if id.starts_with("act_") {
    id.to_string()
  } else {
    format!("act_{id}")
  }
}

fn build_ads_url(
  base_url: &str,
  ad_account_id: &str,
  access_token: &str,
  opts: &FetchOptions,
) -> Result<String, OptimizerError> {
  let base = base_url.trim_end_matches('/');
  let account = normalize_account_id(ad_account_id);
  let fields = [
    "id".to_string(),
    "name".to_string(),
    "creative{body,title,object_story_spec,image_url,thumbnail_url}".to_string(),
    format!(
      "insights.date_preset({}){{impressions,clicks,ctr,cpc,actions,spend}}",
      opts.date_preset
    ),
  ]
  .join(",");

  let mut url = url::Url::parse(&format!("{base}/{account}/ads"))
    .map_err(|e| OptimizerError::InvalidRequest(format!("invalid Facebook ads url: {e}")))?;
  url
    .query_pairs_mut()
    .append_pair("fields", &fields)
    .append_pair("limit", &opts.limit.to_string())
    .append_pair("access_token", access_token);
  Ok(url.to_string())
}

fn str_field(obj: &Value, key: &str) -> String {
  obj.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string()
}

fn purchase_count(insights: &Value) -> f64 {
  insights
    .get("actions")
    .and_then(|v| v.as_array())
    .and_then(|actions| {
      actions
        .iter()
        .find(|a| a.get("action_type").and_then(|v| v.as_str()) == Some("purchase"))
    })
    .and_then(|a| a.get("value"))
    .map(safe_number)
    .unwrap_or(0.0)
}

fn parse_ad(ad: &Value) -> CreativeMetric {
  let empty = Value::Null;
  let creative = ad.get("creative").unwrap_or(&empty);
  let insights = ad
    .get("insights")
    .and_then(|v| v.get("data"))
    .and_then(|v| v.as_array())
    .and_then(|rows| rows.first())
    .unwrap_or(&empty);

  let image_url = Some(str_field(creative, "image_url"))
    .filter(|s| !s.is_empty())
    .unwrap_or_else(|| str_field(creative, "thumbnail_url"));

  let id = match ad.get("id") {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Number(n)) => n.to_string(),
    _ => String::new(),
  };

  CreativeMetric {
    id,
    name: ad.get("name").and_then(|v| v.as_str()).map(|s| s.to_string()),
    headline: str_field(creative, "title"),
    primary_text: str_field(creative, "body"),
    description: Some(String::new()),
    cta: String::new(),
    image_url: Some(image_url),
    impressions: insights.get("impressions").map(safe_number).unwrap_or(0.0),
    clicks: insights.get("clicks").map(safe_number).unwrap_or(0.0),
    // Graph API reports CTR as a percentage.
    ctr: insights.get("ctr").map(safe_number).unwrap_or(0.0) / 100.0,
    cpc: insights.get("cpc").map(safe_number).unwrap_or(0.0),
    conversions: purchase_count(insights),
    // Not derived from the Graph payload; scoring treats 0 as "no signal".
    cost_per_conversion: 0.0,
    roas: 0.0,
    extra: Default::default(),
  }
}

fn parse_ads(json: &Value) -> Vec<CreativeMetric> {
  json
    .get("data")
    .and_then(|v| v.as_array())
    .map(|ads| ads.iter().map(parse_ad).collect())
    .unwrap_or_default()
}

/// Fetches one page of ads with their creative copy and insights for the
/// account, normalized into `CreativeMetric`s.
///
/// Missing credentials are not an error: the result is empty and carries a note.
pub async fn fetch_creative_metrics(
  api_base_url: &str,
  creds: &FacebookCredentials,
  opts: &FetchOptions,
) -> Result<FacebookFetch, OptimizerError> {
  let access_token = creds.access_token.as_deref().unwrap_or("").trim();
  let ad_account_id = creds.ad_account_id.as_deref().unwrap_or("").trim();
  if access_token.is_empty() || ad_account_id.is_empty() {
    return Ok(FacebookFetch {
      creative_metrics: vec![],
      note: Some("Missing accessToken or adAccountId; returning empty results".to_string()),
    });
  }

  let url = build_ads_url(api_base_url, ad_account_id, access_token, opts)?;
  tracing::info!(
    account = %normalize_account_id(ad_account_id),
    date_preset = %opts.date_preset,
    limit = opts.limit,
    "fetching Facebook ads"
  );

  let resp = send(Method::GET, &url, None).await?;
  if !resp.is_success() {
    return Err(OptimizerError::Upstream {
      service: "Facebook API",
      status: resp.status.as_u16(),
      body: resp.body_text(),
    });
  }

  let json: Value = serde_json::from_slice(&resp.body).map_err(|e| OptimizerError::InvalidJson(e.to_string()))?;
  Ok(FacebookFetch {
    creative_metrics: parse_ads(&json),
    note: None,
  })
}
