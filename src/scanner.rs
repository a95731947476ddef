//! Source directory scanning
//!
//! Lists the archives sitting directly in a source directory. A scan holds no
//! cursor: every call re-reads the directory, so it always reflects what is on
//! disk right now.

use crate::error::{Error, Result};
use crate::types::ArchiveEntry;
use std::fs::{DirEntry, ReadDir};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of archive listings for the watcher
///
/// [`DirectoryScanner`] reads the filesystem; tests substitute their own.
pub trait ArchiveScanner: Send + Sync {
    /// List supported archives currently in `source_dir`
    ///
    /// # Errors
    /// Returns [`Error::SourceMissing`] if `source_dir` does not exist
    fn scan(&self, source_dir: &Path) -> Result<Box<dyn Iterator<Item = ArchiveEntry> + Send>>;
}

/// Filesystem-backed [`ArchiveScanner`]
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectoryScanner;

impl ArchiveScanner for DirectoryScanner {
    fn scan(&self, source_dir: &Path) -> Result<Box<dyn Iterator<Item = ArchiveEntry> + Send>> {
        Ok(Box::new(scan(source_dir)?))
    }
}

/// Lazily scan `source_dir` for supported archives
///
/// Only regular files (or symlinks to regular files) directly inside
/// `source_dir` are yielded. Directories, unsupported names and entries that
/// disappear mid-listing are skipped. Order is whatever the filesystem returns.
pub fn scan(source_dir: &Path) -> Result<ArchiveScan> {
    let entries = std::fs::read_dir(source_dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => Error::SourceMissing {
            path: source_dir.to_path_buf(),
        },
        _ => Error::Io(e),
    })?;

    Ok(ArchiveScan {
        source_dir: source_dir.to_path_buf(),
        entries,
    })
}

/// Iterator over the archives found by [`scan`]
#[derive(Debug)]
pub struct ArchiveScan {
    source_dir: PathBuf,
    entries: ReadDir,
}

impl ArchiveScan {
    fn accept(&self, entry: DirEntry) -> Option<ArchiveEntry> {
        let path = entry.path();

        if !is_regular_file(&entry) {
            debug!(?path, "skipping non-file entry");
            return None;
        }

        let Some(archive) = ArchiveEntry::classify(path) else {
            debug!(source_dir = ?self.source_dir, "skipping entry with non UTF-8 name");
            return None;
        };

        if !archive.kind().is_supported() {
            debug!(file = archive.basename(), "skipping unsupported file");
            return None;
        }

        Some(archive)
    }
}

impl Iterator for ArchiveScan {
    type Item = ArchiveEntry;

    fn next(&mut self) -> Option<ArchiveEntry> {
        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    if let Some(archive) = self.accept(entry) {
                        return Some(archive);
                    }
                }
                Err(e) => {
                    debug!(source_dir = ?self.source_dir, error = %e, "skipping unreadable entry");
                }
            }
        }
    }
}

/// Regular file check that follows symlinks; vanished entries count as not a file
fn is_regular_file(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Ok(ft) if ft.is_file() => true,
        Ok(ft) if ft.is_symlink() => std::fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false),
        _ => false,
    }
}
