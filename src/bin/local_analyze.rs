use vercel_runtime::Error;

use ad_creative_optimizer::config::ServiceConfig;
use ad_creative_optimizer::handler::{run_analysis, AnalyzeRequest, EndpointProfile, SampleBatch, Source};
use ad_creative_optimizer::telemetry::init_tracing;

const LOCAL: EndpointProfile = EndpointProfile {
  name: "local",
  ready_message: "",
  default_source: Source::Custom,
  requires_secret: false,
  sample: SampleBatch::Full,
};

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
  args
    .iter()
    .position(|a| a == flag)
    .and_then(|idx| args.get(idx + 1))
    .cloned()
}

#[tokio::main]
async fn main() -> Result<(), Error> {
  init_tracing();
  let args: Vec<String> = std::env::args().collect();

  // Without --file the bundled sample creatives are analyzed.
  let mut body = match parse_flag_value(&args, "--file") {
    Some(path) => {
      let raw = std::fs::read_to_string(&path)?;
      let value: serde_json::Value = serde_json::from_str(&raw)?;
      if value.is_array() {
        serde_json::json!({ "creativeMetrics": value })
      } else {
        value
      }
    }
    None => serde_json::json!({}),
  };

  if !body.is_object() {
    eprintln!("--file must contain a JSON object or an array of creatives");
    return Ok(());
  }

  if let Some(n) = parse_flag_value(&args, "--num-variants") {
    let Ok(n) = n.parse::<u64>() else {
      eprintln!("Invalid --num-variants: {n}");
      return Ok(());
    };
    body["numVariants"] = serde_json::json!(n);
  }

  for (flag, key) in [
    ("--brand-name", "name"),
    ("--voice", "voice"),
    ("--audience", "audience"),
    ("--product", "product"),
  ] {
    if let Some(v) = parse_flag_value(&args, flag) {
      if !body.get("brand").is_some_and(|b| b.is_object()) {
        body["brand"] = serde_json::json!({});
      }
      body["brand"][key] = serde_json::json!(v);
    }
  }

  let cfg = ServiceConfig::from_env();
  let req = AnalyzeRequest::from_json(&body, LOCAL.default_source);
  let summary = run_analysis(&cfg, &LOCAL, &req).await?;

  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}
