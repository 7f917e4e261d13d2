//! HTTP client for a remote semantic scoring server.
//!
//! The server exposes `GET /health`, `POST /compare` and
//! `POST /compare-questions`, all JSON with camelCase fields.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use markwise_core::error::ScorerError;
use markwise_core::traits::{
    CompareRequest, CompareResponse, HealthStatus, QuestionCompareRequest, SemanticScorer,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runs of whitespace, dots and commas.
static QUESTION_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s.,]+").unwrap());
/// A leading "q1", "q.2." style number. Dots are already spaces here.
static QUESTION_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^q\s*(\d+)\s*").unwrap());

/// Split a question into its leading number (zeros dropped) and the
/// remaining text with punctuation runs collapsed.
fn question_parts(question: &str) -> (Option<String>, String) {
    let lowered = question.trim().to_lowercase();
    let collapsed = QUESTION_PUNCT.replace_all(&lowered, " ");
    let collapsed = collapsed.trim();
    match QUESTION_PREFIX.captures(collapsed) {
        Some(caps) => {
            let digits = caps[1].trim_start_matches('0');
            let number = if digits.is_empty() { "0" } else { digits };
            let stem = collapsed[caps[0].len()..].trim().to_string();
            (Some(number.to_string()), stem)
        }
        None => (None, collapsed.to_string()),
    }
}

/// Whether two questions are identical up to punctuation and case.
///
/// Both the number and the stem must agree, and at least one of them must be
/// present. Anything else is left to the server.
pub fn same_question_locally(a: &str, b: &str) -> bool {
    let (number_a, stem_a) = question_parts(a);
    let (number_b, stem_b) = question_parts(b);
    number_a == number_b && stem_a == stem_b && (number_a.is_some() || !stem_a.is_empty())
}

/// Remote semantic scorer over HTTP.
pub struct RemoteScorer {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

#[derive(Deserialize)]
struct QuestionCompareReply {
    #[serde(default, rename = "isSame")]
    is_same: Value,
}

impl RemoteScorer {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url.trim()
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> ScorerError {
        if e.is_timeout() {
            ScorerError::Timeout(self.timeout.as_millis() as u64)
        } else if e.is_connect() {
            ScorerError::Network(format!(
                "scoring server not reachable at {}",
                self.base_url
            ))
        } else {
            ScorerError::Network(e.to_string())
        }
    }

    /// Send a request and return the JSON body of a 2xx response.
    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, ScorerError> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScorerError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ScorerError::InvalidResponse(format!("body is not JSON: {e}")))
    }
}

/// Validate a `/compare` body: `markAwarded` must be a number and
/// `explanation` a string.
fn parse_compare_reply(body: &Value) -> Result<CompareResponse, ScorerError> {
    let mark_awarded = body
        .get("markAwarded")
        .and_then(Value::as_f64)
        .ok_or_else(|| ScorerError::InvalidResponse("markAwarded is not a number".into()))?;
    let explanation = body
        .get("explanation")
        .and_then(Value::as_str)
        .ok_or_else(|| ScorerError::InvalidResponse("explanation is not a string".into()))?;

    Ok(CompareResponse {
        mark_awarded,
        explanation: explanation.to_string(),
    })
}

#[async_trait]
impl SemanticScorer for RemoteScorer {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn health(&self) -> anyhow::Result<HealthStatus> {
        let body = self.send_json(self.client.get(self.url("/health"))).await?;
        let status: HealthStatus = serde_json::from_value(body)
            .map_err(|e| ScorerError::InvalidResponse(e.to_string()))?;
        tracing::debug!("health check passed: {}", status.status);
        Ok(status)
    }

    #[instrument(skip(self, request), fields(max_mark = request.max_mark))]
    async fn compare_answers(&self, request: &CompareRequest) -> anyhow::Result<CompareResponse> {
        tracing::debug!(
            student_answer = %request.student_answer,
            model_answer = %request.model_answer,
            "sending answer comparison"
        );
        let body = self
            .send_json(self.client.post(self.url("/compare")).json(request))
            .await?;

        let reply = parse_compare_reply(&body).map_err(|e| {
            tracing::warn!("invalid /compare response: {body}");
            e
        })?;
        Ok(reply)
    }

    #[instrument(skip(self, request))]
    async fn compare_questions(&self, request: &QuestionCompareRequest) -> anyhow::Result<bool> {
        if same_question_locally(&request.student_question, &request.model_question) {
            tracing::debug!("questions match after normalization, skipping remote call");
            return Ok(true);
        }

        let body = self
            .send_json(self.client.post(self.url("/compare-questions")).json(request))
            .await?;
        let reply: QuestionCompareReply = serde_json::from_value(body)
            .map_err(|e| ScorerError::InvalidResponse(e.to_string()))?;

        // Only a literal `true` counts.
        Ok(reply.is_same == Value::Bool(true))
    }
}
