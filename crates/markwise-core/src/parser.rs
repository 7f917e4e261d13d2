//! Answer key and submission parsers.
//!
//! Both inputs may be TOML or JSON; the format follows the file extension
//! (`.json` is JSON, anything else is TOML).

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ValidationError;
use crate::index::{canonical_key, QuestionIndex};
use crate::matcher::QuestionMatcher;
use crate::model::{AnswerKey, ModelAnswerEntry, StudentSubmission};

/// Intermediate structure for answer key files.
#[derive(Debug, Deserialize)]
struct AnswerKeyFile {
    answer_key: AnswerKeyHeader,
    #[serde(default)]
    questions: Vec<ModelAnswerEntry>,
}

#[derive(Debug, Deserialize)]
struct AnswerKeyHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// Intermediate structure for submission files.
#[derive(Debug, Deserialize)]
struct SubmissionsFile {
    #[serde(default)]
    students: Vec<StudentSubmission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Toml,
    Json,
}

impl InputFormat {
    fn of(path: &Path) -> Self {
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            InputFormat::Json
        } else {
            InputFormat::Toml
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(content: &str, source_path: &Path) -> Result<T> {
    let decoded = match InputFormat::of(source_path) {
        InputFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        InputFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    decoded.map_err(|reason| {
        ValidationError::MalformedInput {
            path: source_path.display().to_string(),
            reason,
        }
        .into()
    })
}

/// Parse an answer key file.
pub fn parse_answer_key(path: &Path) -> Result<AnswerKey> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer key: {}", path.display()))?;

    parse_answer_key_str(&content, path)
}

/// Parse answer key text; `source_path` picks the format and names errors.
pub fn parse_answer_key_str(content: &str, source_path: &Path) -> Result<AnswerKey> {
    let parsed: AnswerKeyFile = decode(content, source_path)?;

    Ok(AnswerKey {
        id: parsed.answer_key.id,
        name: parsed.answer_key.name,
        description: parsed.answer_key.description,
        entries: parsed.questions,
    })
}

/// Parse a submissions file into per-student submissions, in file order.
pub fn parse_submissions(path: &Path) -> Result<Vec<StudentSubmission>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submissions: {}", path.display()))?;

    parse_submissions_str(&content, path)
}

/// Parse submissions text; `source_path` picks the format and names errors.
pub fn parse_submissions_str(content: &str, source_path: &Path) -> Result<Vec<StudentSubmission>> {
    let parsed: SubmissionsFile = decode(content, source_path)?;
    Ok(parsed.students)
}

/// A non-fatal problem found while validating inputs.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Question label or student the warning is about, if any.
    pub subject: Option<String>,
    pub message: String,
}

impl ValidationWarning {
    fn about(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            message: message.into(),
        }
    }
}

/// Check an answer key for common authoring mistakes.
pub fn validate_answer_key(key: &AnswerKey) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if key.entries.is_empty() {
        warnings.push(ValidationWarning {
            subject: None,
            message: ValidationError::EmptyAnswerKey(key.id.clone()).to_string(),
        });
        return warnings;
    }

    let mut seen = HashSet::new();
    for entry in &key.entries {
        let canonical = canonical_key(&entry.question);
        if !seen.insert(canonical.clone()) {
            warnings.push(ValidationWarning::about(
                &entry.question,
                format!("duplicate question key '{canonical}', only the first entry is used"),
            ));
        }
    }

    for entry in &key.entries {
        if entry.question.trim().is_empty() {
            warnings.push(ValidationWarning::about(&entry.question, "question text is empty"));
        }
        if entry.answer.trim().is_empty() {
            warnings.push(ValidationWarning::about(&entry.question, "model answer is empty"));
        }
        if entry.max_mark == 0 {
            warnings.push(ValidationWarning::about(
                &entry.question,
                "mark is 0, every answer will count as correct",
            ));
        }
    }

    warnings
}

/// Check submissions against the index they will be matched with.
///
/// Only the local matching tiers are consulted; labels that would need the
/// remote comparator are reported as unmatched.
pub fn validate_submissions(
    submissions: &[StudentSubmission],
    index: &QuestionIndex,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if submissions.is_empty() {
        warnings.push(ValidationWarning {
            subject: None,
            message: ValidationError::EmptyStudentList.to_string(),
        });
        return warnings;
    }

    let matcher = QuestionMatcher::indexed(index);
    for submission in submissions {
        let who = submission.student.display_name();
        if submission.answers.is_empty() {
            warnings.push(ValidationWarning::about(&who, "submission has no answers"));
            continue;
        }
        for answer in &submission.answers {
            if matcher.match_local(&answer.question_label).is_none() {
                warnings.push(ValidationWarning::about(
                    &who,
                    format!(
                        "question '{}' has no entry in the answer key and will be skipped",
                        answer.question_label
                    ),
                ));
            }
        }
    }

    warnings
}
