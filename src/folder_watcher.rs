//! Polling folder watcher for automatic archive extraction
//!
//! The watcher turns a plain directory into a work queue. Every tick it lists
//! the archives in the source directory, compares the listing with the previous
//! tick, and runs the [`ProcessingTrigger`] for each archive it has not seen
//! before. A trigger that succeeds moves the archive out of the directory, so
//! the next listing no longer contains it.
//!
//! The previously-seen set lives in memory only. After a restart every archive
//! still in the source directory is triggered again, and its destination folder
//! is overwritten in place.
//!
//! Processing is strictly sequential: one archive at a time, in scan order.
//!
//! # Example
//!
//! ```no_run
//! use archive_intake::config::Config;
//! use archive_intake::folder_watcher::FolderWatcher;
//! use archive_intake::scanner::DirectoryScanner;
//! use archive_intake::trigger::ExtractAndRelocate;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> archive_intake::Result<()> {
//! let config = Config::default();
//! let watcher = FolderWatcher::new(
//!     config.extraction.source_dir.clone(),
//!     config.watch.clone(),
//!     Arc::new(DirectoryScanner),
//!     Arc::new(ExtractAndRelocate::from_config(&config)),
//! );
//!
//! let cancel = CancellationToken::new();
//! // Runs until the token is cancelled
//! watcher.run(cancel).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::WatchConfig;
use crate::error::{Error, Result};
use crate::scanner::ArchiveScanner;
use crate::trigger::{ProcessingTrigger, TriggerOutcome};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Basenames present in the source directory at the end of the previous tick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchState {
    seen: HashSet<String>,
}

impl WatchState {
    /// Whether `basename` was already seen
    pub fn contains(&self, basename: &str) -> bool {
        self.seen.contains(basename)
    }

    /// Number of basenames tracked
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Where the watcher is in its loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatcherPhase {
    /// Between ticks
    Idle,
    /// Scanning and triggering
    Polling,
}

/// Counts for a single tick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Archives present in the source directory
    pub present: usize,
    /// Archives not seen on the previous tick, in trigger order
    pub triggered: Vec<String>,
    /// Triggers that moved or deleted their archive
    pub relocated: usize,
    /// Triggers that succeeded but left their archive in place
    pub retained: usize,
    /// Triggers that failed
    pub failed: usize,
}

/// Polls a source directory and triggers processing for new archives
pub struct FolderWatcher {
    source_dir: PathBuf,
    config: WatchConfig,
    scanner: Arc<dyn ArchiveScanner>,
    trigger: Arc<dyn ProcessingTrigger>,
    state: WatchState,
    phase: WatcherPhase,
}

impl FolderWatcher {
    /// Create a new folder watcher with an empty seen-set
    pub fn new(
        source_dir: PathBuf,
        config: WatchConfig,
        scanner: Arc<dyn ArchiveScanner>,
        trigger: Arc<dyn ProcessingTrigger>,
    ) -> Self {
        Self {
            source_dir,
            config,
            scanner,
            trigger,
            state: WatchState::default(),
            phase: WatcherPhase::Idle,
        }
    }

    /// Current seen-set
    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Current phase
    pub fn phase(&self) -> WatcherPhase {
        self.phase
    }

    /// Run one poll cycle
    ///
    /// Scans the source directory, triggers every archive not seen on the
    /// previous tick (one at a time, in scan order), then records what is left.
    /// A failing trigger is logged and does not stop the others.
    ///
    /// # Errors
    /// Only a failed scan is returned (e.g. [`Error::SourceMissing`]); the
    /// seen-set is left untouched in that case.
    pub async fn tick(&mut self) -> Result<TickReport> {
        self.phase = WatcherPhase::Polling;
        let result = self.poll().await;
        self.phase = WatcherPhase::Idle;
        result
    }

    async fn poll(&mut self) -> Result<TickReport> {
        let current: Vec<_> = self.scanner.scan(&self.source_dir)?.collect();

        let mut report = TickReport {
            present: current.len(),
            ..Default::default()
        };
        let mut gone = HashSet::new();

        for entry in current.iter().filter(|e| !self.state.contains(e.basename())) {
            debug!(archive = entry.basename(), kind = %entry.kind(), "new archive detected");
            report.triggered.push(entry.basename().to_string());

            match self.trigger.process(entry).await {
                Ok(TriggerOutcome::Relocated(dest)) => {
                    info!(archive = entry.basename(), ?dest, "archive processed");
                    report.relocated += 1;
                    gone.insert(entry.basename());
                }
                Ok(TriggerOutcome::Retained) => {
                    info!(
                        archive = entry.basename(),
                        "archive processed, left in source directory"
                    );
                    report.retained += 1;
                }
                Err(e) => {
                    warn!(
                        archive = entry.basename(),
                        error = %e,
                        error_code = e.error_code(),
                        "failed to process archive"
                    );
                    report.failed += 1;
                    if self.config.retry_failed {
                        gone.insert(entry.basename());
                    }
                }
            }
        }

        self.state.seen = current
            .iter()
            .map(|e| e.basename())
            .filter(|name| !gone.contains(name))
            .map(str::to_string)
            .collect();

        Ok(report)
    }

    /// Run the polling loop until `cancel` fires
    ///
    /// Cancellation is checked at the start of each tick and before each sleep,
    /// and interrupts the sleep itself.
    ///
    /// # Errors
    /// Returns [`Error::SourceMissing`] if the source directory is missing at
    /// startup or disappears while running. Per-archive failures never end the loop.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        if !self.source_dir.is_dir() {
            return Err(Error::SourceMissing {
                path: self.source_dir.clone(),
            });
        }

        info!(
            source_dir = ?self.source_dir,
            interval_secs = self.config.interval.as_secs_f64(),
            "Folder watcher started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.tick().await {
                Ok(report) if !report.triggered.is_empty() => {
                    info!(
                        triggered = report.triggered.len(),
                        relocated = report.relocated,
                        retained = report.retained,
                        failed = report.failed,
                        "tick complete"
                    );
                }
                Ok(report) => {
                    debug!(present = report.present, "no new archives");
                }
                Err(e) => {
                    error!(error = %e, error_code = e.error_code(), "Folder watcher stopping");
                    return Err(e);
                }
            }

            if cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!("Folder watcher stopped");
        Ok(())
    }
}
