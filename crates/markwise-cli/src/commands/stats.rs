//! The `markwise stats` command.

use std::path::PathBuf;

use anyhow::Result;

use markwise_core::report::EvaluationReport;

use super::{leaderboard_table, summary_lines};

pub fn execute(report_path: PathBuf, format: String) -> Result<()> {
    let mut report = EvaluationReport::load_json(&report_path)?;
    report.recompute_statistics();

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report.statistics)?);
        }
        _ => {
            // text format
            println!(
                "Report {} for '{}' ({})",
                report.id,
                report.answer_key.name,
                report.created_at.format("%Y-%m-%d %H:%M UTC")
            );
            if report.batch.cancelled {
                println!("Note: evaluation was cancelled; results are partial.");
            }
            for line in summary_lines(&report.statistics) {
                println!("{line}");
            }
            if !report.statistics.leaderboard.is_empty() {
                println!("\n{}", leaderboard_table(&report.statistics));
            }
        }
    }

    Ok(())
}
