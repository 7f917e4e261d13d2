//! Mock scorer for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use markwise_core::error::ScorerError;
use markwise_core::normalize::fold;
use markwise_core::traits::{
    CompareRequest, CompareResponse, HealthStatus, QuestionCompareRequest, SemanticScorer,
};

pub const MOCK_EXPLANATION: &str = "Scored by the mock scorer.";

/// A mock scorer for exercising the engine without a scoring server.
///
/// Awards marks based on student answer content matching.
pub struct MockScorer {
    /// Map of answer substring → mark awarded.
    marks: HashMap<String, f64>,
    /// Mark awarded if no substring matches.
    default_mark: f64,
    /// Fail every call as if the server were down.
    unavailable: bool,
    /// Number of `compare_answers` calls made.
    call_count: AtomicU32,
    /// Last answer comparison received.
    last_request: Mutex<Option<CompareRequest>>,
}

impl MockScorer {
    /// Create a mock with the given substring→mark mappings.
    pub fn new(marks: HashMap<String, f64>) -> Self {
        Self {
            marks,
            default_mark: 0.0,
            unavailable: false,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always awards the same mark.
    pub fn with_fixed_mark(mark: f64) -> Self {
        Self {
            default_mark: mark,
            ..Self::new(HashMap::new())
        }
    }

    /// Create a mock whose every call fails with a network error.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(HashMap::new())
        }
    }

    /// Get the number of answer comparisons made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last answer comparison received.
    pub fn last_request(&self) -> Option<CompareRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn check_available(&self) -> Result<(), ScorerError> {
        if self.unavailable {
            Err(ScorerError::Network("mock scorer is unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SemanticScorer for MockScorer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health(&self) -> anyhow::Result<HealthStatus> {
        self.check_available()?;
        Ok(HealthStatus {
            status: "ok".into(),
            details: serde_json::Map::new(),
        })
    }

    async fn compare_answers(&self, request: &CompareRequest) -> anyhow::Result<CompareResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());
        self.check_available()?;

        let mark_awarded = self
            .marks
            .iter()
            .find(|(key, _)| request.student_answer.contains(key.as_str()))
            .map(|(_, mark)| *mark)
            .unwrap_or(self.default_mark);

        Ok(CompareResponse {
            mark_awarded,
            explanation: MOCK_EXPLANATION.to_string(),
        })
    }

    async fn compare_questions(&self, request: &QuestionCompareRequest) -> anyhow::Result<bool> {
        self.check_available()?;
        Ok(fold(&request.student_question) == fold(&request.model_question))
    }
}
