//! The `markwise validate` command.

use std::path::PathBuf;

use anyhow::Result;

use markwise_core::index::QuestionIndex;
use markwise_core::parser::{self, ValidationWarning};

fn print_warnings(warnings: &[ValidationWarning]) {
    for w in warnings {
        let prefix = w
            .subject
            .as_ref()
            .map(|subject| format!("  [{subject}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }
}

pub fn execute(answer_key_path: PathBuf, submissions_path: Option<PathBuf>) -> Result<()> {
    let answer_key = parser::parse_answer_key(&answer_key_path)?;
    println!(
        "Answer key: {} ({} questions, {} marks)",
        answer_key.name,
        answer_key.entries.len(),
        answer_key.total_marks()
    );

    let mut warnings = parser::validate_answer_key(&answer_key);
    print_warnings(&warnings);

    if let Some(path) = submissions_path {
        let submissions = parser::parse_submissions(&path)?;
        println!("Submissions: {} students", submissions.len());

        let index = QuestionIndex::build(answer_key.entries);
        let submission_warnings = parser::validate_submissions(&submissions, &index);
        print_warnings(&submission_warnings);
        warnings.extend(submission_warnings);
    }

    if warnings.is_empty() {
        println!("All inputs valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
