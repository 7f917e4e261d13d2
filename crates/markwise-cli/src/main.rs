//! markwise CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "markwise", version, about = "Batch grader for free-text exam answers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a batch of student submissions against an answer key
    Evaluate {
        /// Answer key file (.toml or .json)
        #[arg(long)]
        answer_key: PathBuf,

        /// Student submissions file (.toml or .json)
        #[arg(long)]
        submissions: PathBuf,

        /// Scoring server base URL (overrides config)
        #[arg(long)]
        scorer_url: Option<String>,

        /// Per-call timeout in seconds (overrides config)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Retries after transient scorer failures (overrides config)
        #[arg(long)]
        max_retries: Option<u32>,

        /// Match by exact question text, then ask the scoring server entry by entry (no question-number matching)
        #[arg(long)]
        legacy_matching: bool,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate an answer key and, optionally, submissions
    Validate {
        /// Answer key file
        #[arg(long)]
        answer_key: PathBuf,

        /// Student submissions file
        #[arg(long)]
        submissions: Option<PathBuf>,
    },

    /// Recompute and print statistics from a saved report
    Stats {
        /// Report JSON
        #[arg(long)]
        report: PathBuf,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check that the scoring server is reachable
    Health {
        /// Scoring server base URL (overrides config)
        #[arg(long)]
        scorer_url: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config, answer key and submissions
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("markwise=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            answer_key,
            submissions,
            scorer_url,
            timeout_secs,
            max_retries,
            legacy_matching,
            output,
            format,
            config,
        } => {
            commands::evaluate::execute(commands::evaluate::EvaluateArgs {
                answer_key,
                submissions,
                scorer_url,
                timeout_secs,
                max_retries,
                legacy_matching,
                output,
                format,
                config,
            })
            .await
        }
        Commands::Validate {
            answer_key,
            submissions,
        } => commands::validate::execute(answer_key, submissions),
        Commands::Stats { report, format } => commands::stats::execute(report, format),
        Commands::Health { scorer_url, config } => {
            commands::health::execute(scorer_url, config).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
