//! Per-archive processing hook invoked by the watcher
//!
//! The watcher calls a [`ProcessingTrigger`] once for every archive that newly
//! appears in the source directory. The trigger owns the whole job: extracting
//! the archive and, on success, taking it out of the source directory so later
//! scans no longer see it.

use crate::config::{AfterProcess, Config};
use crate::error::{Error, ExtractionError, Result};
use crate::extraction;
use crate::types::ArchiveEntry;
use crate::utils::get_unique_path;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info};

/// What happened to the source archive after successful processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The archive was moved to the given path, or deleted (`None`)
    Relocated(Option<PathBuf>),
    /// The archive was left in the source directory
    Retained,
}

/// Hook run for each newly discovered archive
///
/// Returning `Err` means the archive is still in the source directory and was
/// not fully processed; the watcher logs it and moves on.
#[async_trait]
pub trait ProcessingTrigger: Send + Sync {
    /// Process one archive
    async fn process(&self, entry: &ArchiveEntry) -> Result<TriggerOutcome>;
}

/// Default trigger: extract, then apply the [`AfterProcess`] action
#[derive(Clone, Debug)]
pub struct ExtractAndRelocate {
    dest_root: PathBuf,
    processed_dir: PathBuf,
    after_process: AfterProcess,
}

impl ExtractAndRelocate {
    /// Create a trigger extracting into `dest_root`
    pub fn new(dest_root: PathBuf, processed_dir: PathBuf, after_process: AfterProcess) -> Self {
        Self {
            dest_root,
            processed_dir,
            after_process,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.extraction.dest_dir.clone(),
            config.processed_dir(),
            config.watch.after_process,
        )
    }

    /// Run the after-process action for an extracted archive
    async fn relocate(&self, path: &Path) -> Result<TriggerOutcome> {
        match self.after_process {
            AfterProcess::Delete => {
                debug!("Deleting archive: {}", path.display());
                tokio::fs::remove_file(path)
                    .await
                    .map_err(|e| Error::Relocation {
                        path: path.to_path_buf(),
                        reason: format!("failed to delete file: {}", e),
                    })?;
                info!("Deleted processed archive: {}", path.display());
                Ok(TriggerOutcome::Relocated(None))
            }
            AfterProcess::MoveToProcessed => {
                tokio::fs::create_dir_all(&self.processed_dir)
                    .await
                    .map_err(|e| Error::Relocation {
                        path: path.to_path_buf(),
                        reason: format!("failed to create processed directory: {}", e),
                    })?;

                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| Error::Relocation {
                        path: path.to_path_buf(),
                        reason: "file has no UTF-8 name".to_string(),
                    })?;
                let dest = get_unique_path(&self.processed_dir, file_name)?;

                debug!("Moving archive: {} -> {}", path.display(), dest.display());
                tokio::fs::rename(path, &dest)
                    .await
                    .map_err(|e| Error::Relocation {
                        path: path.to_path_buf(),
                        reason: format!("failed to move file: {}", e),
                    })?;
                info!("Moved processed archive to: {}", dest.display());
                Ok(TriggerOutcome::Relocated(Some(dest)))
            }
            AfterProcess::Keep => {
                debug!("Keeping archive in place: {}", path.display());
                Ok(TriggerOutcome::Retained)
            }
        }
    }
}

#[async_trait]
impl ProcessingTrigger for ExtractAndRelocate {
    async fn process(&self, entry: &ArchiveEntry) -> Result<TriggerOutcome> {
        // Extraction is blocking filesystem work
        let owned_entry = entry.clone();
        let dest_root = self.dest_root.clone();
        let result = spawn_blocking(move || extraction::extract(&owned_entry, &dest_root))
            .await
            .map_err(|e| {
                Error::Extraction(ExtractionError::TaskFailed {
                    archive: entry.path().to_path_buf(),
                    reason: e.to_string(),
                })
            })?;

        let dest_dir = result.dest_dir.clone();
        let files = result.into_result()?;
        info!(
            archive = entry.basename(),
            ?dest_dir,
            extracted_count = files.len(),
            "archive extracted"
        );

        self.relocate(entry.path()).await
    }
}
