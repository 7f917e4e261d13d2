//! Scriptable scorer used by unit tests in this crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScorerError;
use crate::traits::{
    CompareRequest, CompareResponse, HealthStatus, QuestionCompareRequest, SemanticScorer,
};

type AnswerFn = dyn Fn(&CompareRequest) -> anyhow::Result<CompareResponse> + Send + Sync;

pub(crate) struct FakeScorer {
    answer: Box<AnswerFn>,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl FakeScorer {
    pub(crate) fn new(
        answer: impl Fn(&CompareRequest) -> anyhow::Result<CompareResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            answer: Box::new(answer),
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Always award `mark` with a fixed explanation.
    pub(crate) fn fixed(mark: f64) -> Self {
        Self::new(move |_| {
            Ok(CompareResponse {
                mark_awarded: mark,
                explanation: "partially covers the key points".into(),
            })
        })
    }

    /// Always fail as if the server were down.
    pub(crate) fn unreachable() -> Self {
        Self::new(|_| Err(ScorerError::Network("connection refused".into()).into()))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SemanticScorer for FakeScorer {
    fn name(&self) -> &str {
        "fake"
    }

    async fn health(&self) -> anyhow::Result<HealthStatus> {
        Ok(serde_json::from_value(serde_json::json!({"status": "ok"}))?)
    }

    async fn compare_answers(&self, request: &CompareRequest) -> anyhow::Result<CompareResponse> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.answer)(request)
    }

    async fn compare_questions(&self, request: &QuestionCompareRequest) -> anyhow::Result<bool> {
        Ok(request.student_question == request.model_question)
    }
}
