//! Evaluation result types.
//!
//! Records are built once by the engine and never mutated afterwards. The
//! constructors enforce the mark invariants so every consumer can rely on
//! them.

use serde::{Deserialize, Serialize};

use crate::matcher::MatchTier;
use crate::model::StudentIdentity;
use crate::statistics::percentage;

/// How a record's mark was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreProvenance {
    /// Normalized answer equal to the model answer; no remote call.
    ExactMatch,
    /// Mark returned by the semantic scorer.
    RemoteScored,
    /// Scorer failed; zero awarded.
    Degraded,
}

/// Display status of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionStatus {
    Correct,
    Partial,
    Incorrect,
}

/// The outcome for one matched question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Question text from the answer key.
    pub question: String,
    /// Label the student used for this question.
    pub student_question: String,
    /// Normalized student answer.
    pub student_answer: String,
    /// Normalized model answer.
    pub correct_answer: String,
    pub awarded_marks: u32,
    pub max_marks: u32,
    /// `awarded_marks == max_marks`.
    pub is_correct: bool,
    pub explanation: String,
    pub provenance: ScoreProvenance,
    pub matched_by: MatchTier,
}

impl EvaluationRecord {
    /// Build a record. `awarded_marks` is capped at `max_marks`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        question: String,
        student_question: String,
        student_answer: String,
        correct_answer: String,
        awarded_marks: u32,
        max_marks: u32,
        explanation: String,
        provenance: ScoreProvenance,
        matched_by: MatchTier,
    ) -> Self {
        let awarded_marks = awarded_marks.min(max_marks);
        Self {
            question,
            student_question,
            student_answer,
            correct_answer,
            awarded_marks,
            max_marks,
            is_correct: awarded_marks == max_marks,
            explanation,
            provenance,
            matched_by,
        }
    }

    pub fn status(&self) -> QuestionStatus {
        if self.is_correct {
            QuestionStatus::Correct
        } else if self.awarded_marks > 0 {
            QuestionStatus::Partial
        } else {
            QuestionStatus::Incorrect
        }
    }
}

/// All records for one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentEvaluation {
    pub student: StudentIdentity,
    pub records: Vec<EvaluationRecord>,
    /// Sum of `awarded_marks`.
    pub total_score: u64,
    /// Sum of `max_marks`.
    pub total_possible: u64,
    /// Set when evaluation of this student was aborted by an unexpected failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StudentEvaluation {
    /// Freeze a student's records, computing the totals.
    pub fn from_records(student: StudentIdentity, records: Vec<EvaluationRecord>) -> Self {
        let total_score = records.iter().map(|r| r.awarded_marks as u64).sum();
        let total_possible = records.iter().map(|r| r.max_marks as u64).sum();
        Self {
            student,
            records,
            total_score,
            total_possible,
            error: None,
        }
    }

    /// A placeholder for a student whose evaluation failed outright.
    pub fn failed(student: StudentIdentity, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::from_records(student, Vec::new())
        }
    }

    pub fn percentage(&self) -> f64 {
        percentage(self.total_score, self.total_possible)
    }

    pub fn correct_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_correct).count()
    }
}

/// Results for a whole batch, in submission order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchEvaluation {
    pub students: Vec<StudentEvaluation>,
    /// `true` when the run was cancelled before every student finished.
    #[serde(default)]
    pub cancelled: bool,
}

impl BatchEvaluation {
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StudentEvaluation> {
        self.students.get(index)
    }
}
