//! The `markwise health` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use markwise_scorer::config::ScorerKind;
use markwise_scorer::create_scorer;

use super::load_config_with_url;

pub async fn execute(scorer_url: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_with_url(config_path.as_deref(), scorer_url)?;
    let target = match config.scorer.kind {
        ScorerKind::Remote => config.scorer.base_url.clone(),
        ScorerKind::Mock => "mock scorer".to_string(),
    };

    let scorer = create_scorer(&config.scorer)?;
    let health = scorer
        .health()
        .await
        .with_context(|| format!("health check failed for {target}"))?;

    let status = if health.status.is_empty() {
        "ok"
    } else {
        health.status.as_str()
    };
    println!("Scoring server {target} is up (status: {status})");
    for (key, value) in &health.details {
        println!("  {key}: {value}");
    }

    Ok(())
}
