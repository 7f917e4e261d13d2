//! Scorer configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use markwise_core::scorer::ScorerPolicy;
use markwise_core::traits::SemanticScorer;

use crate::mock::MockScorer;
use crate::remote::{RemoteScorer, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Environment variable that overrides the scorer base URL.
pub const SCORER_URL_ENV: &str = "MARKWISE_SCORER_URL";

/// Which scorer backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    #[default]
    Remote,
    Mock,
}

/// The `[scorer]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    #[serde(rename = "type", default)]
    pub kind: ScorerKind,
    /// Base URL of the scoring server (remote only).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a transient failure.
    #[serde(default)]
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Mark the mock scorer awards to every non-exact answer.
    #[serde(default)]
    pub mock_mark: f64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./markwise-results")
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            kind: ScorerKind::default(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay(),
            mock_mark: 0.0,
        }
    }
}

impl ScorerConfig {
    /// Timeout and retry policy for the answer scorer.
    pub fn policy(&self) -> ScorerPolicy {
        ScorerPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Top-level markwise configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkwiseConfig {
    #[serde(default)]
    pub scorer: ScorerConfig,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for MarkwiseConfig {
    fn default() -> Self {
        Self {
            scorer: ScorerConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `markwise.toml` in the current directory
/// 2. `~/.config/markwise/config.toml`
///
/// `MARKWISE_SCORER_URL` overrides the scorer base URL.
pub fn load_config() -> Result<MarkwiseConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MarkwiseConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("markwise.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<MarkwiseConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => MarkwiseConfig::default(),
    };

    if let Ok(url) = std::env::var(SCORER_URL_ENV) {
        if !url.trim().is_empty() {
            config.scorer.base_url = url;
        }
    }

    config.scorer.base_url = resolve_env_vars(&config.scorer.base_url);
    if config.scorer.base_url.trim().is_empty() {
        config.scorer.base_url = default_base_url();
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("markwise"))
}

/// Create a scorer instance from its configuration.
pub fn create_scorer(config: &ScorerConfig) -> Result<Arc<dyn SemanticScorer>> {
    match config.kind {
        ScorerKind::Remote => {
            let scorer = RemoteScorer::new(
                &config.base_url,
                Duration::from_secs(config.timeout_secs),
            )?;
            tracing::debug!("using remote scorer at {}", scorer.base_url());
            Ok(Arc::new(scorer))
        }
        ScorerKind::Mock => Ok(Arc::new(MockScorer::with_fixed_mark(config.mock_mark))),
    }
}
