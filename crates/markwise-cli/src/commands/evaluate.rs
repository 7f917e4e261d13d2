//! The `markwise evaluate` command.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;

use markwise_core::engine::{EngineConfig, EvaluationEngine, MatchingMode, ProgressReporter};
use markwise_core::model::StudentIdentity;
use markwise_core::parser;
use markwise_core::report::EvaluationReport;
use markwise_core::results::{EvaluationRecord, StudentEvaluation};
use markwise_scorer::create_scorer;

use super::{leaderboard_table, load_config_with_url, summary_lines};

pub struct EvaluateArgs {
    pub answer_key: PathBuf,
    pub submissions: PathBuf,
    pub scorer_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub legacy_matching: bool,
    pub output: Option<PathBuf>,
    pub format: String,
    pub config: Option<PathBuf>,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_student_start(&self, position: usize, student: &StudentIdentity) {
        eprintln!("  [{}] {}", position + 1, student.display_name());
    }

    fn on_question_scored(&self, _position: usize, record: &EvaluationRecord) {
        eprintln!(
            "      {} -> {}/{} ({:?})",
            record.student_question, record.awarded_marks, record.max_marks, record.provenance
        );
    }

    fn on_question_skipped(&self, _position: usize, label: &str, reason: &str) {
        eprintln!("      {label} skipped: {reason}");
    }

    fn on_student_complete(&self, _position: usize, evaluation: &StudentEvaluation) {
        match &evaluation.error {
            Some(error) => eprintln!("      ERROR: {error}"),
            None => eprintln!(
                "      total {}/{} ({:.1}%)",
                evaluation.total_score,
                evaluation.total_possible,
                evaluation.percentage()
            ),
        }
    }

    fn on_batch_complete(&self, total: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {total} students evaluated, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(args: EvaluateArgs) -> Result<()> {
    anyhow::ensure!(
        matches!(args.format.as_str(), "json" | "markdown" | "md" | "all"),
        "unknown format '{}': expected json, markdown or all",
        args.format
    );

    let mut config = load_config_with_url(args.config.as_deref(), args.scorer_url)?;
    if let Some(timeout) = args.timeout_secs {
        anyhow::ensure!(timeout >= 1, "timeout must be at least 1 second");
        config.scorer.timeout_secs = timeout;
    }
    if let Some(retries) = args.max_retries {
        config.scorer.max_retries = retries;
    }

    let answer_key = parser::parse_answer_key(&args.answer_key)?;
    let submissions = parser::parse_submissions(&args.submissions)?;
    tracing::debug!(
        "loaded {} questions and {} submissions",
        answer_key.entries.len(),
        submissions.len()
    );

    for warning in parser::validate_answer_key(&answer_key) {
        eprintln!("Warning: {}", warning.message);
    }

    let client = create_scorer(&config.scorer)?;
    let engine = EvaluationEngine::new(
        &answer_key,
        client,
        EngineConfig {
            scorer: config.scorer.policy(),
            matching: if args.legacy_matching {
                MatchingMode::Legacy
            } else {
                MatchingMode::Indexed
            },
        },
    )?;

    let cancel = engine.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, finishing the current question...");
            cancel.cancel();
        }
    });

    eprintln!(
        "markwise v{}: evaluating {} students against '{}' ({} questions, scorer: {})",
        env!("CARGO_PKG_VERSION"),
        submissions.len(),
        answer_key.name,
        answer_key.entries.len(),
        engine.scorer().client().name()
    );
    eprintln!();

    let start = Instant::now();
    let batch = engine.evaluate_batch(&submissions, &ConsoleReporter).await?;
    let report = EvaluationReport::new(&answer_key, batch, start.elapsed().as_millis() as u64);

    if report.batch.cancelled {
        eprintln!(
            "Warning: evaluation was cancelled; {} of {} students evaluated",
            report.batch.len(),
            submissions.len()
        );
    }

    eprintln!("\n{}", leaderboard_table(&report.statistics));
    for line in summary_lines(&report.statistics) {
        eprintln!("{line}");
    }
    eprintln!();

    let output = args.output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;
    let stem = report.file_stem();

    let formats: Vec<&str> = if args.format == "all" {
        vec!["json", "markdown"]
    } else {
        vec![args.format.as_str()]
    };

    for fmt in formats {
        match fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            _ => {
                let path = output.join(format!("{stem}.md"));
                report.save_markdown(&path)?;
                eprintln!("Markdown summary: {}", path.display());
            }
        }
    }

    Ok(())
}
