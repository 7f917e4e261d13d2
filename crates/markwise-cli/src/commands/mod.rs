pub mod evaluate;
pub mod health;
pub mod init;
pub mod stats;
pub mod validate;

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use markwise_core::statistics::BatchStatistics;
use markwise_scorer::config::{load_config_from, MarkwiseConfig, ScorerKind};

/// Load config and apply a `--scorer-url` override.
///
/// An explicit URL always selects the remote scorer.
pub(crate) fn load_config_with_url(
    config_path: Option<&Path>,
    scorer_url: Option<String>,
) -> Result<MarkwiseConfig> {
    let mut config = load_config_from(config_path)?;
    if let Some(url) = scorer_url {
        config.scorer.kind = ScorerKind::Remote;
        config.scorer.base_url = url;
    }
    Ok(config)
}

/// Leaderboard as a terminal table.
pub(crate) fn leaderboard_table(stats: &BatchStatistics) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Rank", "Student", "Roll", "Score", "%"]);

    for (rank, entry) in stats.leaderboard.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&entry.student.name),
            Cell::new(&entry.student.roll),
            Cell::new(format!("{}/{}", entry.score, entry.total)),
            Cell::new(format!("{:.1}%", entry.pct)),
        ]);
    }

    table
}

/// Summary lines: average, best, worst and distribution.
pub(crate) fn summary_lines(stats: &BatchStatistics) -> Vec<String> {
    let mut lines = vec![
        format!("Students: {}", stats.total_students),
        format!("Average: {:.1}%", stats.average_pct),
    ];
    if let Some(best) = &stats.best {
        lines.push(format!(
            "Best: {} ({:.1}%)",
            best.student.display_name(),
            best.pct
        ));
    }
    if let Some(worst) = &stats.worst {
        lines.push(format!(
            "Worst: {} ({:.1}%)",
            worst.student.display_name(),
            worst.pct
        ));
    }
    lines.push(format!(
        "Distribution: {} good, {} average, {} low",
        stats.distribution.good, stats.distribution.avg, stats.distribution.low
    ));
    lines
}
