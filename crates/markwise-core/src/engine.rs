//! Central evaluation engine.
//!
//! Evaluates one student's answers question by question, and a batch of
//! students one after another. Students and questions are processed strictly
//! sequentially so at most one remote scoring call is outstanding.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;

use crate::error::ValidationError;
use crate::index::QuestionIndex;
use crate::matcher::QuestionMatcher;
use crate::model::{AnswerKey, StudentAnswerEntry, StudentIdentity, StudentSubmission};
use crate::normalize::normalize;
use crate::results::{BatchEvaluation, EvaluationRecord, StudentEvaluation};
use crate::scorer::{AnswerScorer, ScorerPolicy};
use crate::traits::SemanticScorer;

/// How student labels are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchingMode {
    /// Canonical key index, then text scan.
    #[default]
    Indexed,
    /// Text scan, then per-entry remote question comparison.
    Legacy,
}

/// Configuration for the evaluation engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub scorer: ScorerPolicy,
    pub matching: MatchingMode,
}

/// Cooperative cancellation shared between the engine and its caller.
///
/// Checked before every student and every question. A remote call already in
/// flight is bounded by the scorer timeout, not interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_student_start(&self, position: usize, student: &StudentIdentity);
    fn on_question_scored(&self, position: usize, record: &EvaluationRecord);
    fn on_question_skipped(&self, position: usize, label: &str, reason: &str);
    fn on_student_complete(&self, position: usize, evaluation: &StudentEvaluation);
    fn on_batch_complete(&self, total: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_student_start(&self, _: usize, _: &StudentIdentity) {}
    fn on_question_scored(&self, _: usize, _: &EvaluationRecord) {}
    fn on_question_skipped(&self, _: usize, _: &str, _: &str) {}
    fn on_student_complete(&self, _: usize, _: &StudentEvaluation) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// Reason recorded for labels with no model entry.
pub const NO_MATCH_REASON: &str = "no matching question in answer key";

/// The evaluation engine for one answer key.
pub struct EvaluationEngine {
    index: QuestionIndex,
    scorer: AnswerScorer,
    matching: MatchingMode,
    cancel: CancellationFlag,
}

impl EvaluationEngine {
    /// Build the question index for `answer_key`. Fails on an empty key.
    pub fn new(
        answer_key: &AnswerKey,
        client: Arc<dyn SemanticScorer>,
        config: EngineConfig,
    ) -> Result<Self, ValidationError> {
        if answer_key.entries.is_empty() {
            return Err(ValidationError::EmptyAnswerKey(answer_key.id.clone()));
        }

        Ok(Self {
            index: QuestionIndex::build(answer_key.entries.clone()),
            scorer: AnswerScorer::new(client, config.scorer),
            matching: config.matching,
            cancel: CancellationFlag::new(),
        })
    }

    /// Use a caller-owned cancellation flag.
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn index(&self) -> &QuestionIndex {
        &self.index
    }

    pub fn scorer(&self) -> &AnswerScorer {
        &self.scorer
    }

    fn matcher(&self) -> QuestionMatcher<'_> {
        match self.matching {
            MatchingMode::Indexed => QuestionMatcher::indexed(&self.index),
            MatchingMode::Legacy => QuestionMatcher::legacy(self.index.entries()),
        }
    }

    /// Evaluate one student's submission.
    ///
    /// Unmatched labels are skipped silently. A panic while handling one
    /// question loses only that question.
    pub async fn evaluate_student(
        &self,
        submission: &StudentSubmission,
        progress: &dyn ProgressReporter,
    ) -> StudentEvaluation {
        self.evaluate_student_at(0, submission, progress).await.0
    }

    /// Returns the evaluation and whether it was cut short by cancellation.
    async fn evaluate_student_at(
        &self,
        position: usize,
        submission: &StudentSubmission,
        progress: &dyn ProgressReporter,
    ) -> (StudentEvaluation, bool) {
        let matcher = self.matcher();
        let mut records = Vec::with_capacity(submission.answers.len());
        let mut interrupted = false;

        for entry in &submission.answers {
            if self.cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            let label = entry.question_label.as_str();
            match AssertUnwindSafe(self.evaluate_question(&matcher, entry))
                .catch_unwind()
                .await
            {
                Ok(Some(record)) => {
                    progress.on_question_scored(position, &record);
                    records.push(record);
                }
                Ok(None) => {
                    tracing::debug!("no model entry for question '{label}', skipping");
                    progress.on_question_skipped(position, label, NO_MATCH_REASON);
                }
                Err(payload) => {
                    let reason = panic_message(&*payload);
                    tracing::error!("question '{label}' failed, skipping: {reason}");
                    progress.on_question_skipped(position, label, &reason);
                }
            }
        }

        (
            StudentEvaluation::from_records(submission.student.clone(), records),
            interrupted,
        )
    }

    async fn evaluate_question(
        &self,
        matcher: &QuestionMatcher<'_>,
        entry: &StudentAnswerEntry,
    ) -> Option<EvaluationRecord> {
        let found = matcher.resolve(&entry.question_label, &self.scorer).await?;
        let model = found.entry;
        let outcome = self
            .scorer
            .score(&entry.answer_text, &model.answer, model.max_mark)
            .await;

        Some(EvaluationRecord::new(
            model.question.clone(),
            entry.question_label.clone(),
            normalize(&entry.answer_text),
            normalize(&model.answer),
            outcome.awarded_marks(),
            model.max_mark,
            outcome.explanation().to_string(),
            outcome.provenance(),
            found.tier,
        ))
    }

    /// Evaluate every submission, in order, one at a time.
    ///
    /// A student whose evaluation panics is kept at its position with no
    /// records and `error` set; the rest of the batch continues. On
    /// cancellation the students evaluated so far are returned with
    /// `cancelled` set.
    pub async fn evaluate_batch(
        &self,
        submissions: &[StudentSubmission],
        progress: &dyn ProgressReporter,
    ) -> Result<BatchEvaluation, ValidationError> {
        if submissions.is_empty() {
            return Err(ValidationError::EmptyStudentList);
        }

        let start = Instant::now();
        let mut batch = BatchEvaluation::default();
        let mut failed = 0usize;

        for (position, submission) in submissions.iter().enumerate() {
            if self.cancel.is_cancelled() {
                batch.cancelled = true;
                break;
            }

            progress.on_student_start(position, &submission.student);
            let (evaluation, interrupted) =
                match AssertUnwindSafe(self.evaluate_student_at(position, submission, progress))
                    .catch_unwind()
                    .await
                {
                    Ok(result) => result,
                    Err(payload) => {
                        failed += 1;
                        let reason = panic_message(&*payload);
                        tracing::error!(
                            "evaluation of student {} failed: {reason}",
                            submission.student.display_name()
                        );
                        (StudentEvaluation::failed(submission.student.clone(), reason), false)
                    }
                };

            progress.on_student_complete(position, &evaluation);
            batch.students.push(evaluation);

            if interrupted {
                batch.cancelled = true;
                break;
            }
        }

        if batch.cancelled {
            tracing::warn!(
                "evaluation cancelled after {} of {} students",
                batch.students.len(),
                submissions.len()
            );
        }

        progress.on_batch_complete(batch.students.len(), failed, start.elapsed());
        Ok(batch)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
