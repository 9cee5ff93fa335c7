use crate::copywriter::CopyStrategy;
use crate::providers::facebook::{self, FacebookCredentials};
use crate::providers::gemini::{self, GeminiConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct FacebookSettings {
  /// Used when the request body does not carry its own credentials.
  pub credentials: FacebookCredentials,
  pub api_base_url: String,
}

impl Default for FacebookSettings {
  fn default() -> Self {
    Self {
      credentials: FacebookCredentials::default(),
      api_base_url: facebook::DEFAULT_API_BASE_URL.to_string(),
    }
  }
}

/// Everything a handler needs from its environment, resolved once at cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
  pub facebook: FacebookSettings,
  pub copy: CopyStrategy,
  pub webhook_secret: Option<String>,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      facebook: FacebookSettings::default(),
      copy: CopyStrategy::Template,
      webhook_secret: None,
    }
  }
}

impl ServiceConfig {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Builds the config from any key lookup; blank values count as unset.
  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| {
      lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    };

    let facebook = FacebookSettings {
      credentials: FacebookCredentials {
        access_token: get("FB_ACCESS_TOKEN"),
        ad_account_id: get("FB_AD_ACCOUNT_ID"),
      },
      api_base_url: get("FB_API_BASE_URL").unwrap_or_else(|| facebook::DEFAULT_API_BASE_URL.to_string()),
    };

    let copy = match get("GEMINI_API_KEY") {
      Some(api_key) => CopyStrategy::Gemini(GeminiConfig {
        api_key,
        model: get("GEMINI_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
        api_base_url: get("GEMINI_API_BASE_URL").unwrap_or_else(|| gemini::DEFAULT_API_BASE_URL.to_string()),
      }),
      None => CopyStrategy::Template,
    };

    Self {
      facebook,
      copy,
      webhook_secret: get("WEBHOOK_SECRET"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |key: &str| map.get(key).cloned()
  }

  #[test]
  fn empty_environment_selects_fallbacks() {
    let cfg = ServiceConfig::from_lookup(|_| None);
    assert_eq!(cfg, ServiceConfig::default());
    assert_eq!(cfg.copy, CopyStrategy::Template);
    assert!(cfg.webhook_secret.is_none());
  }

  #[test]
  fn gemini_key_selects_live_copy_with_defaults() {
    let cfg = ServiceConfig::from_lookup(lookup_from(&[
      ("GEMINI_API_KEY", " key-1 "),
      ("WEBHOOK_SECRET", "s3cret"),
      ("FB_ACCESS_TOKEN", "tok"),
      ("FB_AD_ACCOUNT_ID", "   "),
    ]));

    assert_eq!(cfg.copy, CopyStrategy::Gemini(GeminiConfig::new("key-1")));
    assert_eq!(cfg.webhook_secret.as_deref(), Some("s3cret"));
    assert_eq!(cfg.facebook.credentials.access_token.as_deref(), Some("tok"));
    assert!(cfg.facebook.credentials.ad_account_id.is_none());
    assert_eq!(cfg.facebook.api_base_url, facebook::DEFAULT_API_BASE_URL);
  }

  #[test]
  fn overrides_replace_provider_defaults() {
    let cfg = ServiceConfig::from_lookup(lookup_from(&[
      ("GEMINI_API_KEY", "k"),
      ("GEMINI_MODEL", "gemini-2.0-flash"),
      ("GEMINI_API_BASE_URL", "http://127.0.0.1:8080"),
      ("FB_API_BASE_URL", "http://127.0.0.1:8081"),
    ]));

    match cfg.copy {
      CopyStrategy::Gemini(g) => {
        assert_eq!(g.model, "gemini-2.0-flash");
        assert_eq!(g.api_base_url, "http://127.0.0.1:8080");
      }
      CopyStrategy::Template => panic!("expected Gemini strategy"),
    }
    assert_eq!(cfg.facebook.api_base_url, "http://127.0.0.1:8081");
  }
}
