//! # titledrop CLI
//!
//! The `titledrop` binary watches a directory for PDF documents, derives a
//! title for each (text extraction with OCR fallback, then a chat-completion
//! call), and files them into an output directory as `DATE-TITLE.pdf`.
//!
//! ## Usage
//!
//! ```bash
//! titledrop --config ./config/titledrop.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `titledrop watch` | Poll the input directory and process new PDFs forever |
//! | `titledrop once` | Run a single pass over the input directory, then exit |
//! | `titledrop process <file>` | Run the pipeline for one file |
//! | `titledrop check` | Report configuration and collaborator health |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use titledrop::{check, config, pipeline};

/// titledrop — file scanned PDFs under model-inferred titles.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/titledrop.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "titledrop",
    about = "Watched-folder PDF titling: extract text, infer a title, file away as DATE-TITLE.pdf",
    version,
    long_about = "titledrop polls an input directory for PDF documents, extracts their text \
    (embedded text layer first, rasterizing OCR for scans), asks a chat-completion model for a \
    title, and moves each file into an output directory as YYYYMMDD-Sanitized_Title.pdf."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/titledrop.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Watch the input directory and process new PDFs forever.
    ///
    /// Runs one discovery pass every `watch.poll_interval_secs`, processing
    /// files sequentially. Files that fail stay in place and are retried on
    /// later passes, up to `retry.max_attempts`.
    Watch,

    /// Run a single pass over the input directory, then exit.
    ///
    /// Prints a summary of how many files were discovered, renamed, and
    /// failed. Useful for cron-style deployments and smoke tests.
    Once,

    /// Run the pipeline for a single file.
    Process {
        /// Path to the PDF file.
        file: PathBuf,
    },

    /// Report configuration and collaborator health.
    ///
    /// Shows whether the directories, the poppler/tesseract tools, and the
    /// inference credentials are in place. Useful before first `watch`.
    Check,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Watch => {
            let interval = Duration::from_secs(cfg.watch.poll_interval_secs);
            info!(
                "watching {} every {}s, filing into {}",
                cfg.watch.input_dir.display(),
                cfg.watch.poll_interval_secs,
                cfg.watch.output_dir.display()
            );

            let mut processor = pipeline::Processor::new(cfg)?;
            loop {
                // A failed pass (e.g. the input directory vanished) must not
                // kill the watcher; log it and try again next interval.
                match processor.run_pass() {
                    Ok(summary) => {
                        if summary.discovered > 0 {
                            info!(
                                "pass complete: {} discovered, {} renamed, {} failed",
                                summary.discovered, summary.renamed, summary.failed
                            );
                        }
                    }
                    Err(e) => error!("discovery pass failed: {:#}", e),
                }
                std::thread::sleep(interval);
            }
        }
        Commands::Once => {
            let mut processor = pipeline::Processor::new(cfg)?;
            let summary = processor.run_pass()?;
            println!("pass complete");
            println!("  discovered: {}", summary.discovered);
            println!("  renamed: {}", summary.renamed);
            println!("  failed: {}", summary.failed);
            if summary.quarantined > 0 {
                println!("  quarantined: {}", summary.quarantined);
            }
            println!("ok");
        }
        Commands::Process { file } => {
            let processor = pipeline::Processor::new(cfg)?;
            let destination = processor.process(&file)?;
            println!("renamed {} -> {}", file.display(), destination.display());
        }
        Commands::Check => {
            check::run_check(&cfg)?;
        }
    }

    Ok(())
}
