//! Resolve a student's question label to a model answer entry.
//!
//! Resolution is tiered; the first tier that finds an entry wins:
//!
//! 1. canonical key lookup in the [`QuestionIndex`]
//! 2. scan for an entry whose folded question text equals the folded label
//! 3. legacy mode only: ask the semantic scorer, entry by entry, whether the
//!    two questions are the same

use serde::{Deserialize, Serialize};

use crate::index::{canonical_key, QuestionIndex};
use crate::model::ModelAnswerEntry;
use crate::normalize::fold;
use crate::scorer::AnswerScorer;

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    CanonicalKey,
    NormalizedText,
    RemoteComparator,
}

/// A resolved question.
#[derive(Debug, Clone, Copy)]
pub struct QuestionMatch<'a> {
    pub entry: &'a ModelAnswerEntry,
    pub tier: MatchTier,
}

/// Matches labels against one answer key.
#[derive(Debug, Clone, Copy)]
pub struct QuestionMatcher<'a> {
    index: Option<&'a QuestionIndex>,
    entries: &'a [ModelAnswerEntry],
}

impl<'a> QuestionMatcher<'a> {
    /// Matcher backed by a pre-built index. Never calls the scorer.
    pub fn indexed(index: &'a QuestionIndex) -> Self {
        Self {
            index: Some(index),
            entries: index.entries(),
        }
    }

    /// Matcher without an index: text scan, then remote comparison.
    pub fn legacy(entries: &'a [ModelAnswerEntry]) -> Self {
        Self {
            index: None,
            entries,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.index.is_none()
    }

    /// Tiers that need no remote call.
    pub fn match_local(&self, label: &str) -> Option<QuestionMatch<'a>> {
        if let Some(index) = self.index {
            if let Some(entry) = index.get(&canonical_key(label)) {
                return Some(QuestionMatch {
                    entry,
                    tier: MatchTier::CanonicalKey,
                });
            }
        }

        let wanted = fold(label);
        self.entries
            .iter()
            .find(|e| fold(&e.question) == wanted)
            .map(|entry| QuestionMatch {
                entry,
                tier: MatchTier::NormalizedText,
            })
    }

    /// Resolve a label, falling back to the remote comparator in legacy mode.
    pub async fn resolve(&self, label: &str, scorer: &AnswerScorer) -> Option<QuestionMatch<'a>> {
        if let Some(found) = self.match_local(label) {
            return Some(found);
        }
        if !self.is_legacy() {
            return None;
        }

        for entry in self.entries {
            if scorer.same_question(label, &entry.question).await {
                return Some(QuestionMatch {
                    entry,
                    tier: MatchTier::RemoteComparator,
                });
            }
        }
        None
    }
}
