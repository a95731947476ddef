//! # archive-intake
//!
//! Extracts archives dropped into a watched directory, once per arrival.
//!
//! ## Overview
//!
//! - [`extraction`] classifies archives by name (ZIP, tar with gzip/bzip2/xz,
//!   single-file gzip/bzip2) and unpacks each into `dest_root/<name>/`, refusing
//!   members that would escape that folder.
//! - [`scanner`] lists the archives currently in a source directory.
//! - [`folder_watcher`] polls the source directory and runs a
//!   [`trigger::ProcessingTrigger`] for every archive it has not seen before.
//!   The default trigger extracts and then moves the archive into a
//!   `processed` folder, so the directory itself acts as the work queue.
//!
//! ## Quick Start
//!
//! ```no_run
//! use archive_intake::extraction::extract_all;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = extract_all(Path::new("data"), Path::new("archive"))?;
//!     println!("{} extracted, {} failed", report.succeeded(), report.failed());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive classification and extraction
pub mod extraction;
/// Polling watcher
pub mod folder_watcher;
/// Logging setup for the binaries
pub mod logging;
/// Source directory scanning
pub mod scanner;
/// Per-archive processing hook
pub mod trigger;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{AfterProcess, Config, ExtractionConfig, WatchConfig};
pub use error::{Error, ExtractionError, Result};
pub use extraction::{BatchReport, classify, extract, extract_all};
pub use folder_watcher::{FolderWatcher, TickReport, WatchState, WatcherPhase};
pub use scanner::{ArchiveScanner, DirectoryScanner, scan};
pub use trigger::{ExtractAndRelocate, ProcessingTrigger, TriggerOutcome};
pub use types::{ArchiveEntry, ArchiveKind, ExtractionResult, ExtractionStatus, ExtractionTarget};

use tokio_util::sync::CancellationToken;

/// Cancel `token` when a termination signal arrives
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use archive_intake::cancel_on_shutdown;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let cancel = CancellationToken::new();
///     tokio::spawn(cancel_on_shutdown(cancel.clone()));
///     cancel.cancelled().await;
/// }
/// ```
pub async fn cancel_on_shutdown(token: CancellationToken) {
    wait_for_signal().await;
    token.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
