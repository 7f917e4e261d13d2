//! Core data model types for markwise.
//!
//! These are the input-side types: the model answer key and the student
//! submissions evaluated against it.

use serde::{Deserialize, Serialize};

/// One question of the model answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAnswerEntry {
    /// Question text as written in the key (e.g. "Q1. What is inertia?").
    pub question: String,
    /// Reference answer.
    pub answer: String,
    /// Marks available for this question.
    #[serde(rename = "mark", alias = "max_mark", alias = "maxMark")]
    pub max_mark: u32,
}

impl ModelAnswerEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, max_mark: u32) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            max_mark,
        }
    }
}

/// A model answer key: the reference set for one evaluation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKey {
    /// Session/model identifier supplied by the caller.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the paper or assessment.
    #[serde(default)]
    pub description: String,
    /// Entries in the order they were authored.
    #[serde(default)]
    pub entries: Vec<ModelAnswerEntry>,
}

impl AnswerKey {
    /// Total marks available across all entries.
    pub fn total_marks(&self) -> u64 {
        self.entries.iter().map(|e| e.max_mark as u64).sum()
    }
}

/// Who a submission belongs to. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    #[serde(default = "default_student_name")]
    pub name: String,
    #[serde(default)]
    pub roll: String,
    #[serde(default = "default_email")]
    pub email: String,
}

fn default_student_name() -> String {
    "Student".to_string()
}

fn default_email() -> String {
    "N/A".to_string()
}

impl Default for StudentIdentity {
    fn default() -> Self {
        Self {
            name: default_student_name(),
            roll: String::new(),
            email: default_email(),
        }
    }
}

impl StudentIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// "Name (roll)" or just "Name" when no roll number is known.
    pub fn display_name(&self) -> String {
        if self.roll.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.roll)
        }
    }
}

/// One extracted question/answer pair from a student's paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAnswerEntry {
    /// Raw question label as extracted (e.g. "Q.08", "q8)").
    #[serde(rename = "question")]
    pub question_label: String,
    /// Raw answer text as extracted.
    #[serde(rename = "answer")]
    pub answer_text: String,
}

impl StudentAnswerEntry {
    pub fn new(question_label: impl Into<String>, answer_text: impl Into<String>) -> Self {
        Self {
            question_label: question_label.into(),
            answer_text: answer_text.into(),
        }
    }
}

/// A student's full submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSubmission {
    #[serde(flatten)]
    pub student: StudentIdentity,
    #[serde(default)]
    pub answers: Vec<StudentAnswerEntry>,
}

impl StudentSubmission {
    pub fn new(student: StudentIdentity, answers: Vec<StudentAnswerEntry>) -> Self {
        Self { student, answers }
    }
}
