//! Core trait definition for semantic scorers.
//!
//! The trait is implemented by the `markwise-scorer` crate (HTTP client and
//! mock). The engine only ever talks to a `dyn SemanticScorer`, so tests can
//! swap in a fake without network access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Semantic scorer trait
// ---------------------------------------------------------------------------

/// A backend that judges free-text answers and question equivalence.
///
/// Errors should be [`crate::error::ScorerError`] wrapped in `anyhow::Error`
/// so callers can classify them; any other error is treated as the server
/// being unavailable.
#[async_trait]
pub trait SemanticScorer: Send + Sync {
    /// Human-readable scorer name (e.g. "remote").
    fn name(&self) -> &str;

    /// Liveness probe.
    async fn health(&self) -> anyhow::Result<HealthStatus>;

    /// Score a student answer against the model answer.
    async fn compare_answers(&self, request: &CompareRequest) -> anyhow::Result<CompareResponse>;

    /// Decide whether two question texts ask the same thing.
    async fn compare_questions(&self, request: &QuestionCompareRequest) -> anyhow::Result<bool>;
}

/// Body of `POST /compare`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub student_answer: String,
    pub model_answer: String,
    pub max_mark: u32,
}

/// Validated reply from `POST /compare`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    /// Raw mark as returned; may be fractional or out of range.
    pub mark_awarded: f64,
    pub explanation: String,
}

/// Body of `POST /compare-questions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCompareRequest {
    pub student_question: String,
    pub model_question: String,
}

/// Reply from `GET /health`. Extra fields are kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_request_wire_shape() {
        let req = CompareRequest {
            student_answer: "a".into(),
            model_answer: "b".into(),
            max_mark: 5,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"studentAnswer": "a", "modelAnswer": "b", "maxMark": 5})
        );
    }

    #[test]
    fn question_request_wire_shape() {
        let req = QuestionCompareRequest {
            student_question: "Q1".into(),
            model_question: "Q1. Define".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["studentQuestion"], "Q1");
        assert_eq!(json["modelQuestion"], "Q1. Define");
    }

    #[test]
    fn health_keeps_extra_fields() {
        let health: HealthStatus =
            serde_json::from_str(r#"{"status":"ok","gpu_available":true}"#).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.details["gpu_available"], true);
    }
}
