//! Batch statistics: average, best/worst, distribution and leaderboard.
//!
//! Everything here is derived from a [`BatchEvaluation`] and recomputed on
//! demand; nothing mutates the batch.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::StudentIdentity;
use crate::results::BatchEvaluation;

/// Lower bound (inclusive) of the "good" band.
pub const GOOD_THRESHOLD: f64 = 70.0;
/// Lower bound (inclusive) of the "average" band.
pub const AVERAGE_THRESHOLD: f64 = 40.0;

/// `score / total * 100`, or 0 when `total` is 0.
pub fn percentage(score: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    score as f64 / total as f64 * 100.0
}

/// Performance band of a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeBand {
    Good,
    Average,
    Low,
}

impl GradeBand {
    pub fn of(pct: f64) -> Self {
        if pct >= GOOD_THRESHOLD {
            GradeBand::Good
        } else if pct >= AVERAGE_THRESHOLD {
            GradeBand::Average
        } else {
            GradeBand::Low
        }
    }
}

/// Count of students per band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// `pct >= 70`
    pub good: usize,
    /// `40 <= pct < 70`
    pub avg: usize,
    /// `pct < 40`
    pub low: usize,
}

/// One student's standing, pointing back into the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Position of this student in the unsorted batch.
    pub original_index: usize,
    pub student: StudentIdentity,
    pub score: u64,
    pub total: u64,
    pub pct: f64,
}

/// Derived statistics for one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub total_students: usize,
    /// Mean of the per-student percentages.
    pub average_pct: f64,
    pub best: Option<LeaderboardEntry>,
    pub worst: Option<LeaderboardEntry>,
    pub distribution: Distribution,
    /// Students by percentage, highest first. Ties keep submission order.
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Compute statistics for a batch.
pub fn aggregate(batch: &BatchEvaluation) -> BatchStatistics {
    let entries: Vec<LeaderboardEntry> = batch
        .students
        .iter()
        .enumerate()
        .map(|(original_index, s)| LeaderboardEntry {
            original_index,
            student: s.student.clone(),
            score: s.total_score,
            total: s.total_possible,
            pct: percentage(s.total_score, s.total_possible),
        })
        .collect();

    let average_pct = if entries.is_empty() {
        0.0
    } else {
        entries.iter().map(|e| e.pct).sum::<f64>() / entries.len() as f64
    };

    // Strict comparisons: on ties the earlier student stays.
    let mut best: Option<&LeaderboardEntry> = None;
    let mut worst: Option<&LeaderboardEntry> = None;
    for entry in &entries {
        if best.map_or(true, |b| entry.pct > b.pct) {
            best = Some(entry);
        }
        if worst.map_or(true, |w| entry.pct < w.pct) {
            worst = Some(entry);
        }
    }

    let mut distribution = Distribution::default();
    for entry in &entries {
        match GradeBand::of(entry.pct) {
            GradeBand::Good => distribution.good += 1,
            GradeBand::Average => distribution.avg += 1,
            GradeBand::Low => distribution.low += 1,
        }
    }

    let best = best.cloned();
    let worst = worst.cloned();

    let mut leaderboard = entries;
    // `sort_by` is stable.
    leaderboard.sort_by(|a, b| b.pct.partial_cmp(&a.pct).unwrap_or(Ordering::Equal));

    BatchStatistics {
        total_students: batch.students.len(),
        average_pct,
        best,
        worst,
        distribution,
        leaderboard,
    }
}
