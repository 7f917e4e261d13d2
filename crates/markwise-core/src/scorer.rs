//! Score one answer: exact-match fast path, remote fallback, degrade to zero.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ScorerError;
use crate::normalize::{fold, normalize};
use crate::results::ScoreProvenance;
use crate::traits::{CompareRequest, CompareResponse, QuestionCompareRequest, SemanticScorer};

/// Explanation attached to exact matches.
pub const PERFECT_MATCH_EXPLANATION: &str = "Perfect match with model answer.";

/// Explanation used when the scorer returns an empty one.
pub const NO_EXPLANATION: &str = "No explanation provided.";

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Timeout and retry policy for remote calls.
#[derive(Debug, Clone)]
pub struct ScorerPolicy {
    /// Per-call timeout. Expiry counts as the server being unavailable.
    pub timeout: Duration,
    /// Extra attempts after a transient failure. 0 means a single attempt.
    pub max_retries: u32,
    /// Initial delay between attempts; doubles each retry.
    pub retry_delay: Duration,
}

impl Default for ScorerPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 0,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Result of scoring one answer, tagged by how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    /// Folded answers were identical; full marks without a remote call.
    ExactMatch { awarded_marks: u32 },
    /// The semantic scorer answered.
    RemoteScored {
        awarded_marks: u32,
        explanation: String,
    },
    /// The semantic scorer failed; zero awarded.
    Degraded { explanation: String },
}

impl ScoreOutcome {
    pub fn awarded_marks(&self) -> u32 {
        match self {
            ScoreOutcome::ExactMatch { awarded_marks }
            | ScoreOutcome::RemoteScored { awarded_marks, .. } => *awarded_marks,
            ScoreOutcome::Degraded { .. } => 0,
        }
    }

    pub fn explanation(&self) -> &str {
        match self {
            ScoreOutcome::ExactMatch { .. } => PERFECT_MATCH_EXPLANATION,
            ScoreOutcome::RemoteScored { explanation, .. }
            | ScoreOutcome::Degraded { explanation } => explanation,
        }
    }

    pub fn provenance(&self) -> ScoreProvenance {
        match self {
            ScoreOutcome::ExactMatch { .. } => ScoreProvenance::ExactMatch,
            ScoreOutcome::RemoteScored { .. } => ScoreProvenance::RemoteScored,
            ScoreOutcome::Degraded { .. } => ScoreProvenance::Degraded,
        }
    }
}

/// Wraps a [`SemanticScorer`] with the fast path and the failure policy.
pub struct AnswerScorer {
    client: Arc<dyn SemanticScorer>,
    policy: ScorerPolicy,
}

impl AnswerScorer {
    pub fn new(client: Arc<dyn SemanticScorer>, policy: ScorerPolicy) -> Self {
        Self { client, policy }
    }

    pub fn client(&self) -> &dyn SemanticScorer {
        self.client.as_ref()
    }

    pub fn policy(&self) -> &ScorerPolicy {
        &self.policy
    }

    /// Score `student_answer` out of `max_mark`.
    ///
    /// Never fails: remote errors become [`ScoreOutcome::Degraded`].
    pub async fn score(&self, student_answer: &str, model_answer: &str, max_mark: u32) -> ScoreOutcome {
        if fold(student_answer) == fold(model_answer) {
            return ScoreOutcome::ExactMatch {
                awarded_marks: max_mark,
            };
        }

        let request = CompareRequest {
            student_answer: normalize(student_answer),
            model_answer: normalize(model_answer),
            max_mark,
        };

        match self.compare_with_retries(&request).await {
            Ok(response) => {
                let explanation = if response.explanation.trim().is_empty() {
                    NO_EXPLANATION.to_string()
                } else {
                    response.explanation
                };
                let awarded_marks = clamp_mark(response.mark_awarded, max_mark);
                if awarded_marks as f64 != response.mark_awarded {
                    tracing::debug!(
                        "remote mark {} adjusted to {awarded_marks}/{max_mark}",
                        response.mark_awarded
                    );
                }
                ScoreOutcome::RemoteScored {
                    awarded_marks,
                    explanation,
                }
            }
            Err(e) => {
                tracing::warn!("scoring via '{}' failed: {e:#}", self.client.name());
                ScoreOutcome::Degraded {
                    explanation: degraded_explanation(&e),
                }
            }
        }
    }

    /// Ask the scorer whether two questions are the same. Failures count as "no".
    pub async fn same_question(&self, student_question: &str, model_question: &str) -> bool {
        let request = QuestionCompareRequest {
            student_question: student_question.to_string(),
            model_question: model_question.to_string(),
        };
        match self
            .with_timeout(self.client.compare_questions(&request))
            .await
        {
            Ok(same) => same,
            Err(e) => {
                tracing::warn!("question comparison failed, treating as different: {e:#}");
                false
            }
        }
    }

    async fn compare_with_retries(&self, request: &CompareRequest) -> anyhow::Result<CompareResponse> {
        let mut retry_delay = self.policy.retry_delay;
        let mut retry = 0;
        loop {
            match self
                .with_timeout(self.client.compare_answers(request))
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) if retry < self.policy.max_retries && is_transient(&e) => {
                    retry += 1;
                    tracing::debug!(
                        "transient scoring error, retry {retry}/{} in {retry_delay:?}: {e}",
                        self.policy.max_retries
                    );
                    tokio::time::sleep(retry_delay).await;
                    retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        match tokio::time::timeout(self.policy.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ScorerError::Timeout(self.policy.timeout.as_millis() as u64).into()),
        }
    }
}

/// Clamp a remote mark into `[0, max_mark]` and drop the fraction.
pub fn clamp_mark(raw: f64, max_mark: u32) -> u32 {
    if !raw.is_finite() {
        return 0;
    }
    raw.clamp(0.0, max_mark as f64).trunc() as u32
}

fn is_transient(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ScorerError>()
        .map(ScorerError::is_transient)
        .unwrap_or(true)
}

fn degraded_explanation(e: &anyhow::Error) -> String {
    match e.downcast_ref::<ScorerError>() {
        Some(ScorerError::InvalidResponse(detail)) => format!(
            "Scoring server returned an invalid response ({detail}), defaulted to 0 marks."
        ),
        Some(other) => format!("Scoring server unavailable ({other}), defaulted to 0 marks."),
        None => format!("Scoring server unavailable ({e}), defaulted to 0 marks."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeScorer;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn scorer_with(fake: Arc<FakeScorer>, policy: ScorerPolicy) -> AnswerScorer {
        AnswerScorer::new(fake, policy)
    }

    #[tokio::test]
    async fn exact_match_skips_remote() {
        let fake = Arc::new(FakeScorer::fixed(1.0));
        let scorer = scorer_with(fake.clone(), ScorerPolicy::default());

        let outcome = scorer
            .score(
                "Paris is the capital of France",
                "paris is the   capital of\nfrance",
                5,
            )
            .await;

        assert_eq!(outcome, ScoreOutcome::ExactMatch { awarded_marks: 5 });
        assert_eq!(outcome.explanation(), "Perfect match with model answer.");
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn remote_mark_is_clamped() {
        let fake = Arc::new(FakeScorer::fixed(7.5));
        let scorer = scorer_with(fake.clone(), ScorerPolicy::default());

        let outcome = scorer.score("ok", "different", 5).await;
        assert_eq!(outcome.awarded_marks(), 5);
        assert_eq!(outcome.provenance(), ScoreProvenance::RemoteScored);
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn negative_and_fractional_marks() {
        let scorer = scorer_with(Arc::new(FakeScorer::fixed(-2.0)), ScorerPolicy::default());
        assert_eq!(scorer.score("a", "b", 5).await.awarded_marks(), 0);

        let scorer = scorer_with(Arc::new(FakeScorer::fixed(3.9)), ScorerPolicy::default());
        assert_eq!(scorer.score("a", "b", 5).await.awarded_marks(), 3);
    }

    #[tokio::test]
    async fn remote_receives_normalized_texts() {
        let fake = Arc::new(FakeScorer::new(|req| {
            assert_eq!(req.student_answer, "student says this");
            assert_eq!(req.model_answer, "model says that");
            assert_eq!(req.max_mark, 4);
            Ok(CompareResponse {
                mark_awarded: 2.0,
                explanation: String::new(),
            })
        }));
        let scorer = scorer_with(fake, ScorerPolicy::default());

        let outcome = scorer
            .score("- student\nsays   this", "  model says that ", 4)
            .await;
        assert_eq!(outcome.awarded_marks(), 2);
        assert_eq!(outcome.explanation(), NO_EXPLANATION);
    }

    #[tokio::test]
    async fn unreachable_server_degrades_to_zero() {
        let scorer = scorer_with(Arc::new(FakeScorer::unreachable()), ScorerPolicy::default());

        let outcome = scorer.score("ok", "different", 5).await;
        assert_eq!(outcome.awarded_marks(), 0);
        assert_eq!(outcome.provenance(), ScoreProvenance::Degraded);
        assert!(outcome.explanation().contains("defaulted to 0 marks"));
        assert!(outcome.explanation().contains("unavailable"));
    }

    #[tokio::test]
    async fn invalid_response_degrades_without_retry() {
        let fake = Arc::new(FakeScorer::new(|_| {
            Err(ScorerError::InvalidResponse("missing markAwarded".into()).into())
        }));
        let policy = ScorerPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let scorer = scorer_with(fake.clone(), policy);

        let outcome = scorer.score("ok", "different", 5).await;
        assert_eq!(outcome.awarded_marks(), 0);
        assert!(outcome.explanation().contains("invalid response"));
        assert!(outcome.explanation().contains("defaulted to 0 marks"));
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_degrades_to_zero() {
        let fake = Arc::new(FakeScorer::fixed(5.0).with_delay(Duration::from_secs(120)));
        let scorer = scorer_with(fake, ScorerPolicy::default());

        let outcome = scorer.score("ok", "different", 5).await;
        assert_eq!(outcome.awarded_marks(), 0);
        assert!(outcome.explanation().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_up_to_limit() {
        let fake = Arc::new(FakeScorer::unreachable());
        let policy = ScorerPolicy {
            max_retries: 2,
            ..Default::default()
        };
        let scorer = scorer_with(fake.clone(), policy);

        let outcome = scorer.score("ok", "different", 5).await;
        assert_eq!(outcome.provenance(), ScoreProvenance::Degraded);
        assert_eq!(fake.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_recovers_after_transient_failure() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let fake = Arc::new(FakeScorer::new(move |_| {
            if counter.fetch_add(1, Ordering::Relaxed) == 0 {
                Err(ScorerError::Api {
                    status: 503,
                    message: "warming up".into(),
                }
                .into())
            } else {
                Ok(CompareResponse {
                    mark_awarded: 4.0,
                    explanation: "good".into(),
                })
            }
        }));
        let policy = ScorerPolicy {
            max_retries: 1,
            ..Default::default()
        };
        let scorer = scorer_with(fake, policy);

        let outcome = scorer.score("ok", "different", 5).await;
        assert_eq!(outcome.awarded_marks(), 4);
        assert_eq!(attempts.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn clamp_mark_edges() {
        assert_eq!(clamp_mark(f64::NAN, 5), 0);
        assert_eq!(clamp_mark(f64::INFINITY, 5), 0);
        assert_eq!(clamp_mark(5.0, 5), 5);
        assert_eq!(clamp_mark(0.99, 1), 0);
        assert_eq!(clamp_mark(100.0, 0), 0);
    }

    #[tokio::test]
    async fn same_question_delegates_to_client() {
        let scorer = scorer_with(Arc::new(FakeScorer::fixed(0.0)), ScorerPolicy::default());
        assert!(scorer.same_question("Q1", "Q1").await);
        assert!(!scorer.same_question("Q1", "Q2").await);
    }
}
