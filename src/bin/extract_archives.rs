//! One-shot extraction of every archive in a source directory

use archive_intake::{Error, extract_all, logging};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Extract archives from a directory
#[derive(Debug, Parser)]
#[command(name = "extract-archives", version, about)]
struct Args {
    /// Source directory containing archives
    #[arg(long, default_value = "data")]
    src: PathBuf,

    /// Destination directory for extracted contents
    #[arg(long, default_value = "archive")]
    dest: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(&args.log_level);

    match extract_all(&args.src, &args.dest) {
        Ok(report) => {
            for (entry, result) in &report.results {
                if let Some(e) = &result.error {
                    tracing::error!(archive = entry.basename(), error = %e, "failed to extract");
                }
            }
            ExitCode::SUCCESS
        }
        Err(e @ Error::SourceMissing { .. }) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "extraction run failed");
            ExitCode::FAILURE
        }
    }
}
