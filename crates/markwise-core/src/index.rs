//! Canonical question keys and the answer-key lookup index.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ModelAnswerEntry;
use crate::normalize::fold;

static QUESTION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bq\s*\.?\s*([0-9]+)\b").expect("question number pattern is valid"));

/// Reduce a question label to the key used for matching.
///
/// Labels carrying a question number ("Q1", "Q.1", "Q 01", "q1)") collapse to
/// `q<number>` with leading zeros dropped. Anything else falls back to the
/// folded label text.
pub fn canonical_key(label: &str) -> String {
    let folded = fold(label);
    match QUESTION_NUMBER
        .captures(&folded)
        .and_then(|caps| caps.get(1))
    {
        Some(digits) => {
            let trimmed = digits.as_str().trim_start_matches('0');
            if trimmed.is_empty() {
                "q0".to_string()
            } else {
                format!("q{trimmed}")
            }
        }
        None => folded,
    }
}

/// A later entry whose key was already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub key: String,
    /// Position of the entry that owns the key.
    pub kept: usize,
    /// Position of the entry that was ignored.
    pub ignored: usize,
}

/// Lookup from canonical key to model answer entry.
///
/// Built once per answer key and read-only afterwards. When two entries share
/// a key, the first one wins.
#[derive(Debug, Clone)]
pub struct QuestionIndex {
    entries: Vec<ModelAnswerEntry>,
    by_key: HashMap<String, usize>,
    duplicates: Vec<DuplicateKey>,
}

impl QuestionIndex {
    pub fn build(entries: Vec<ModelAnswerEntry>) -> Self {
        let mut by_key = HashMap::with_capacity(entries.len());
        let mut duplicates = Vec::new();

        for (position, entry) in entries.iter().enumerate() {
            let key = canonical_key(&entry.question);
            if let Some(&kept) = by_key.get(&key) {
                tracing::warn!(
                    "duplicate question key '{key}': keeping entry {kept}, ignoring entry {position}"
                );
                duplicates.push(DuplicateKey {
                    key,
                    kept,
                    ignored: position,
                });
            } else {
                by_key.insert(key, position);
            }
        }

        Self {
            entries,
            by_key,
            duplicates,
        }
    }

    /// Look up an entry by an already-canonicalized key.
    pub fn get(&self, key: &str) -> Option<&ModelAnswerEntry> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    /// All entries in authoring order, duplicates included.
    pub fn entries(&self) -> &[ModelAnswerEntry] {
        &self.entries
    }

    pub fn duplicates(&self) -> &[DuplicateKey] {
        &self.duplicates
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_labels_share_a_key() {
        assert_eq!(canonical_key("Q.08"), "q8");
        assert_eq!(canonical_key("Q 8"), "q8");
        assert_eq!(canonical_key("q8)"), "q8");
        assert_eq!(canonical_key("Q8. Define inertia"), "q8");
        assert_eq!(canonical_key("  \n- Q . 8"), "q8");
    }

    #[test]
    fn zero_padded_zero() {
        assert_eq!(canonical_key("Q00"), "q0");
    }

    #[test]
    fn q_must_start_a_word() {
        // "faq1" has no word boundary before the q.
        assert_eq!(canonical_key("faq1"), "faq1");
        // "q8a" has no word boundary after the digits.
        assert_eq!(canonical_key("q8a"), "q8a");
    }

    #[test]
    fn unnumbered_labels_fall_back_to_folded_text() {
        assert_eq!(
            canonical_key("  What is\n the Capital of France? "),
            "what is the capital of france?"
        );
        assert_eq!(canonical_key(""), "");
    }

    #[test]
    fn build_index_first_entry_wins() {
        let index = QuestionIndex::build(vec![
            ModelAnswerEntry::new("Q1. First", "a", 2),
            ModelAnswerEntry::new("Q2. Second", "b", 3),
            ModelAnswerEntry::new("Q.01 Repeated", "c", 4),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.entries().len(), 3);
        assert_eq!(index.get("q1").unwrap().answer, "a");
        assert_eq!(
            index.duplicates(),
            &[DuplicateKey {
                key: "q1".into(),
                kept: 0,
                ignored: 2
            }]
        );
    }

    #[test]
    fn empty_index() {
        let index = QuestionIndex::build(vec![]);
        assert!(index.is_empty());
        assert!(index.get("q1").is_none());
    }
}
