use serde::{Deserialize, Serialize};

use crate::scoring::ScoredCreative;

const SUBSET_SIZE: usize = 3;

const GUIDELINES: [&str; 5] = [
  "Lead with the strongest benefit in the first 5 words.",
  "Use concrete numbers and social proof where possible.",
  "Keep primary text under 130 characters for mobile truncation.",
  "Pair copy with a high-contrast product visual or clear before/after.",
  "A/B test 1 variable at a time: hook, proof, CTA.",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Insights {
  pub what_worked: Vec<String>,
  pub what_didnt_work: Vec<String>,
  pub guidelines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightReport {
  pub top: Vec<ScoredCreative>,
  pub bottom: Vec<ScoredCreative>,
  pub insights: Insights,
}

pub fn guidelines() -> Vec<String> {
  GUIDELINES.iter().map(|s| s.to_string()).collect()
}

fn what_worked(top: &[ScoredCreative]) -> Vec<String> {
  let mut out = Vec::new();

  if top.iter().any(|c| c.metric.ctr > 0.02) {
    out.push("Higher CTR (\u{2265} 2%) drove stronger engagement.".to_string());
  }
  if top
    .iter()
    .any(|c| c.metric.headline.contains('%') || c.metric.primary_text.contains('%'))
  {
    out.push("Specific numeric claims in headlines improved performance.".to_string());
  }
  if top.iter().any(|c| {
    let cta = c.metric.cta.to_lowercase();
    cta.contains("shop") || cta.contains("get")
  }) {
    out.push("Clear action-oriented CTAs increased click-through.".to_string());
  }
  if top.iter().any(|c| c.metric.conversions > 0.0) {
    out.push("Direct outcome (conversions) present in top creatives.".to_string());
  }

  out
}

fn what_didnt_work(bottom: &[ScoredCreative]) -> Vec<String> {
  let mut out = Vec::new();

  if bottom.iter().any(|c| c.metric.ctr < 0.005) {
    out.push("Very low CTR (< 0.5%) indicates weak hooks/visuals.".to_string());
  }
  if bottom.iter().any(|c| c.metric.cpc > 3.0) {
    out.push("High CPC suggests low ad relevance or weak targeting.".to_string());
  }
  // An empty bottom set carries no evidence about copy, so the rule stays quiet.
  if !bottom.is_empty()
    && bottom
      .iter()
      .all(|c| c.metric.headline.is_empty() && c.metric.primary_text.is_empty())
  {
    out.push("Missing compelling copy (headline/primary text).".to_string());
  }

  out
}

/// Summarizes what separated the best creatives from the worst.
///
/// `sorted` must already be ordered by score descending; it is read, never
/// reordered. With three or fewer creatives `top` and `bottom` overlap.
pub fn derive_insights(sorted: &[ScoredCreative]) -> InsightReport {
  let n = SUBSET_SIZE.min(sorted.len());
  let top = sorted[..n].to_vec();
  let bottom = sorted[sorted.len() - n..].to_vec();

  let insights = Insights {
    what_worked: what_worked(&top),
    what_didnt_work: what_didnt_work(&bottom),
    guidelines: guidelines(),
  };

  InsightReport { top, bottom, insights }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scoring::{score_and_rank, CreativeMetric};

  fn creative(id: &str, headline: &str, primary_text: &str, cta: &str, ctr: f64, cpc: f64, conversions: f64) -> CreativeMetric {
    CreativeMetric {
      id: id.to_string(),
      headline: headline.to_string(),
      primary_text: primary_text.to_string(),
      cta: cta.to_string(),
      ctr,
      cpc,
      conversions,
      ..CreativeMetric::default()
    }
  }

  fn sample_batch() -> Vec<ScoredCreative> {
    score_and_rank(vec![
      CreativeMetric {
        impressions: 12000.0,
        cost_per_conversion: 5.2,
        roas: 2.4,
        ..creative("S1", "Save 30% Today", "Upgrade your workflow in minutes", "Shop Now", 0.035, 0.45, 38.0)
      },
      CreativeMetric {
        impressions: 8000.0,
        cost_per_conversion: 19.0,
        roas: 0.9,
        ..creative("S2", "All-in-One Toolkit", "Everything you need to launch", "Get Started", 0.01, 1.2, 5.0)
      },
      CreativeMetric {
        impressions: 15000.0,
        cost_per_conversion: 15.0,
        roas: 1.2,
        ..creative("S3", "Trusted by 10,000+ teams", "Ship faster with fewer bugs", "Try Free", 0.01, 1.0, 10.0)
      },
    ])
  }

  #[test]
  fn small_batches_share_top_and_bottom() {
    let sorted = sample_batch();
    let report = derive_insights(&sorted);

    assert_eq!(report.top, sorted);
    assert_eq!(report.bottom, sorted);
    assert_eq!(
      report.insights.what_worked,
      vec![
        "Higher CTR (\u{2265} 2%) drove stronger engagement.",
        "Specific numeric claims in headlines improved performance.",
        "Clear action-oriented CTAs increased click-through.",
        "Direct outcome (conversions) present in top creatives.",
      ]
    );
    assert!(report.insights.what_didnt_work.is_empty());
    assert_eq!(report.insights.guidelines.len(), 5);
  }

  #[test]
  fn subsets_are_capped_at_three_and_taken_from_each_end() {
    let metrics = (0..7)
      .map(|i| CreativeMetric {
        id: format!("c{i}"),
        conversions: (10 - i) as f64,
        ..CreativeMetric::default()
      })
      .collect();
    let sorted = score_and_rank(metrics);
    let before = sorted.clone();
    let report = derive_insights(&sorted);

    let ids = |v: &[ScoredCreative]| v.iter().map(|c| c.metric.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&report.top), vec!["c0", "c1", "c2"]);
    assert_eq!(ids(&report.bottom), vec!["c4", "c5", "c6"]);
    assert_eq!(sorted, before);
  }

  #[test]
  fn flags_weak_bottom_creatives() {
    let sorted = score_and_rank(vec![
      creative("good", "Big win", "Buy", "Learn More", 0.01, 0.5, 0.0),
      creative("a", "", "", "", 0.001, 4.5, 0.0),
      creative("b", "", "", "", 0.003, 5.0, 0.0),
      creative("c", "", "", "", 0.004, 3.5, 0.0),
    ]);
    let report = derive_insights(&sorted);

    assert_eq!(
      report.insights.what_didnt_work,
      vec![
        "Very low CTR (< 0.5%) indicates weak hooks/visuals.",
        "High CPC suggests low ad relevance or weak targeting.",
        "Missing compelling copy (headline/primary text).",
      ]
    );
    assert!(report.insights.what_worked.is_empty());
  }

  #[test]
  fn missing_copy_requires_every_bottom_creative() {
    let sorted = score_and_rank(vec![
      creative("a", "", "", "", 0.01, 1.0, 0.0),
      creative("b", "Has copy", "", "", 0.01, 1.0, 0.0),
    ]);
    let report = derive_insights(&sorted);
    assert!(report.insights.what_didnt_work.is_empty());
  }

  #[test]
  fn cta_match_is_case_insensitive() {
    let sorted = score_and_rank(vec![creative("a", "x", "y", "GET OFFER", 0.0, 0.0, 0.0)]);
    let report = derive_insights(&sorted);
    assert_eq!(
      report.insights.what_worked,
      vec!["Clear action-oriented CTAs increased click-through."]
    );
  }

  #[test]
  fn percent_in_primary_text_counts_as_numeric_claim() {
    let sorted = score_and_rank(vec![creative("a", "Plain", "Now 50% off", "", 0.0, 0.0, 0.0)]);
    let report = derive_insights(&sorted);
    assert_eq!(
      report.insights.what_worked,
      vec!["Specific numeric claims in headlines improved performance."]
    );
  }

  #[test]
  fn ctr_threshold_for_what_worked_is_strict() {
    let at = derive_insights(&score_and_rank(vec![creative("a", "x", "y", "", 0.02, 0.0, 0.0)]));
    assert!(at.insights.what_worked.is_empty());

    let above = derive_insights(&score_and_rank(vec![creative("a", "x", "y", "", 0.0201, 0.0, 0.0)]));
    assert_eq!(
      above.insights.what_worked,
      vec!["Higher CTR (\u{2265} 2%) drove stronger engagement."]
    );
  }

  #[test]
  fn low_ctr_threshold_is_strict() {
    let at = derive_insights(&score_and_rank(vec![creative("a", "x", "y", "", 0.005, 0.0, 0.0)]));
    assert!(at.insights.what_didnt_work.is_empty());

    let below = derive_insights(&score_and_rank(vec![creative("a", "x", "y", "", 0.0049, 0.0, 0.0)]));
    assert_eq!(
      below.insights.what_didnt_work,
      vec!["Very low CTR (< 0.5%) indicates weak hooks/visuals."]
    );
  }

  #[test]
  fn high_cpc_threshold_is_strict() {
    let at = derive_insights(&score_and_rank(vec![creative("a", "x", "y", "", 0.01, 3.0, 0.0)]));
    assert!(at.insights.what_didnt_work.is_empty());

    let above = derive_insights(&score_and_rank(vec![creative("a", "x", "y", "", 0.01, 3.01, 0.0)]));
    assert_eq!(
      above.insights.what_didnt_work,
      vec!["High CPC suggests low ad relevance or weak targeting."]
    );
  }

  #[test]
  fn empty_batch_yields_only_guidelines() {
    let report = derive_insights(&[]);
    assert!(report.top.is_empty());
    assert!(report.bottom.is_empty());
    assert!(report.insights.what_worked.is_empty());
    assert!(report.insights.what_didnt_work.is_empty());
    assert_eq!(report.insights.guidelines, guidelines());
  }

  #[test]
  fn derive_is_repeatable() {
    let sorted = sample_batch();
    assert_eq!(derive_insights(&sorted), derive_insights(&sorted));
  }
}
