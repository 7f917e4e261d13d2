//! Evaluation report types with JSON persistence and a markdown summary.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::AnswerKey;
use crate::results::{BatchEvaluation, QuestionStatus};
use crate::statistics::{aggregate, BatchStatistics, LeaderboardEntry};

/// A complete evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the answer key.
    pub answer_key: AnswerKeySummary,
    /// Per-student results, in submission order.
    pub batch: BatchEvaluation,
    /// Statistics derived from `batch`.
    pub statistics: BatchStatistics,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of an answer key (without the model answers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKeySummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
    pub total_marks: u64,
}

impl From<&AnswerKey> for AnswerKeySummary {
    fn from(key: &AnswerKey) -> Self {
        Self {
            id: key.id.clone(),
            name: key.name.clone(),
            question_count: key.entries.len(),
            total_marks: key.total_marks(),
        }
    }
}

impl EvaluationReport {
    /// Build a report for a finished batch, computing its statistics.
    pub fn new(answer_key: &AnswerKey, batch: BatchEvaluation, duration_ms: u64) -> Self {
        let statistics = aggregate(&batch);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            answer_key: answer_key.into(),
            batch,
            statistics,
            duration_ms,
        }
    }

    /// File stem for this report, e.g. `report-20240101-120000-1a2b3c4d`.
    ///
    /// The id suffix keeps reports written in the same second apart.
    pub fn file_stem(&self) -> String {
        let id = self.id.simple().to_string();
        format!(
            "report-{}-{}",
            self.created_at.format("%Y%m%d-%H%M%S"),
            &id[..8]
        )
    }

    /// Recompute statistics from the stored batch.
    ///
    /// Reports edited by hand or written by older versions may carry stale
    /// statistics; the batch is the source of truth.
    pub fn recompute_statistics(&mut self) -> &BatchStatistics {
        self.statistics = aggregate(&self.batch);
        &self.statistics
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvaluationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Save the markdown summary to a file.
    pub fn save_markdown(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_markdown())
            .with_context(|| format!("failed to write markdown to {}", path.display()))?;
        Ok(())
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let stats = &self.statistics;

        md.push_str(&format!("# {} results\n\n", self.answer_key.name));
        md.push_str(&format!(
            "Generated {} · {} questions · {} marks\n\n",
            self.created_at.format("%Y-%m-%d %H:%M UTC"),
            self.answer_key.question_count,
            self.answer_key.total_marks
        ));

        if self.batch.cancelled {
            md.push_str("> Evaluation was cancelled; results are partial.\n\n");
        }

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Students:** {}\n", stats.total_students));
        md.push_str(&format!("- **Average:** {:.1}%\n", stats.average_pct));
        if let Some(best) = &stats.best {
            md.push_str(&format!("- **Best:** {}\n", standing(best)));
        }
        if let Some(worst) = &stats.worst {
            md.push_str(&format!("- **Worst:** {}\n", standing(worst)));
        }
        md.push_str(&format!(
            "- **Distribution:** {} good (>= 70%), {} average (40-70%), {} low (< 40%)\n\n",
            stats.distribution.good, stats.distribution.avg, stats.distribution.low
        ));

        if !stats.leaderboard.is_empty() {
            md.push_str("## Leaderboard\n\n");
            md.push_str("| Rank | Student | Roll | Score | % |\n");
            md.push_str("|------|---------|------|-------|---|\n");
            for (rank, entry) in stats.leaderboard.iter().enumerate() {
                md.push_str(&format!(
                    "| {} | {} | {} | {}/{} | {:.1}% |\n",
                    rank + 1,
                    cell(&entry.student.name),
                    cell(&entry.student.roll),
                    entry.score,
                    entry.total,
                    entry.pct
                ));
            }
            md.push('\n');
        }

        md.push_str("## Details\n\n");
        for student in &self.batch.students {
            md.push_str(&format!(
                "### {}\n\n",
                student.student.display_name()
            ));
            if let Some(error) = &student.error {
                md.push_str(&format!("Evaluation failed: {error}\n\n"));
                continue;
            }
            if student.records.is_empty() {
                md.push_str("No answers matched the answer key.\n\n");
                continue;
            }
            md.push_str("| Question | Marks | Status | Explanation |\n");
            md.push_str("|----------|-------|--------|-------------|\n");
            for record in &student.records {
                let status = match record.status() {
                    QuestionStatus::Correct => "Correct",
                    QuestionStatus::Partial => "Partial",
                    QuestionStatus::Incorrect => "Incorrect",
                };
                md.push_str(&format!(
                    "| {} | {}/{} | {} | {} |\n",
                    cell(&record.question),
                    record.awarded_marks,
                    record.max_marks,
                    status,
                    cell(&record.explanation)
                ));
            }
            md.push_str(&format!(
                "\n**Total:** {}/{} ({:.1}%)\n\n",
                student.total_score,
                student.total_possible,
                student.percentage()
            ));
        }

        md
    }
}

fn standing(entry: &LeaderboardEntry) -> String {
    format!(
        "{} with {}/{} ({:.1}%)",
        entry.student.display_name(),
        entry.score,
        entry.total,
        entry.pct
    )
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
