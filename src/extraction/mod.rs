//! Archive extraction
//!
//! This module classifies archives by name and unpacks ZIP, tar (plain, gzip,
//! bzip2, xz) and single-file gzip/bzip2 inputs into a per-archive folder under
//! a destination root. Every member path is checked against traversal before it
//! is written.

pub mod format;
mod shared;
mod single;
mod tar;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

// Re-exports
pub use format::{classify, split_archive_name};
pub use single::SingleFileExtractor;
pub use tar::TarExtractor;
pub use zip::ZipExtractor;

use crate::error::{Error, ExtractionError, Result};
use crate::scanner::scan;
use crate::types::{ArchiveEntry, ArchiveKind, ExtractionResult};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Unified archive extraction dispatcher
///
/// Extracts `entry` into `dest_root/<stem>`, where `stem` is the basename with
/// its archive suffix removed. The destination is created if missing and reused
/// if present; re-extracting overwrites files already there.
///
/// Failures are reported through [`ExtractionResult::status`]. Partially written
/// files may remain after a failure, but a destination left empty is removed.
/// The source archive is never modified.
///
/// # Example
/// ```no_run
/// use archive_intake::extraction::extract;
/// use archive_intake::types::ArchiveEntry;
/// use std::path::Path;
///
/// let entry = ArchiveEntry::classify("data/case-2023.tar.gz").unwrap();
/// let result = extract(&entry, Path::new("archive"));
/// if result.is_success() {
///     println!("extracted {} files into {}", result.files.len(), result.dest_dir.display());
/// }
/// ```
pub fn extract(entry: &ArchiveEntry, dest_root: &Path) -> ExtractionResult {
    let dest_dir = entry.target(dest_root).destination_dir;
    match try_extract(entry, dest_root) {
        Ok(files) => ExtractionResult::success(dest_dir, files),
        Err(e) => {
            warn!(
                archive = entry.basename(),
                error = %e,
                error_code = e.error_code(),
                "extraction failed"
            );
            ExtractionResult::failure(dest_dir, e)
        }
    }
}

/// Like [`extract`], but returns the extracted files or the failure cause
pub fn try_extract(
    entry: &ArchiveEntry,
    dest_root: &Path,
) -> std::result::Result<Vec<PathBuf>, ExtractionError> {
    let archive_path = entry.path();
    let kind = entry.kind();

    let Some((stem, _, _)) = split_archive_name(entry.basename()) else {
        return Err(ExtractionError::UnsupportedFormat {
            archive: archive_path.to_path_buf(),
        });
    };
    if !is_single_component(stem) {
        return Err(ExtractionError::InvalidName {
            archive: archive_path.to_path_buf(),
        });
    }

    let dest_dir = dest_root.join(stem);

    info!(
        ?archive_path,
        %kind,
        ?dest_dir,
        "dispatching extraction to appropriate extractor"
    );

    shared::prepare_dest_dir(&dest_dir)?;

    // Route to the appropriate extractor
    let result = match kind {
        ArchiveKind::Zip => ZipExtractor::try_extract(archive_path, &dest_dir),
        kind if kind.is_tar() => TarExtractor::try_extract(kind, archive_path, &dest_dir),
        ArchiveKind::GzSingle | ArchiveKind::Bz2Single => {
            SingleFileExtractor::try_extract(kind, archive_path, stem, &dest_dir)
        }
        _ => Err(ExtractionError::UnsupportedFormat {
            archive: archive_path.to_path_buf(),
        }),
    };

    if result.is_err() {
        shared::remove_if_empty(&dest_dir);
    }

    result
}

/// Whether `stem` names exactly one folder directly under the destination root
///
/// Rejects empty stems and the `.`/`..` left over from names like `..zip` or
/// `...tar.gz`.
fn is_single_component(stem: &str) -> bool {
    let mut components = Path::new(stem).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == stem
    )
}

/// Per-archive results of a one-shot extraction run
#[must_use]
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One result per archive, in scan order
    pub results: Vec<(ArchiveEntry, ExtractionResult)>,
}

impl BatchReport {
    /// Number of archives extracted successfully
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_success()).count()
    }

    /// Number of archives that failed
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Whether no archives were found
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Extract every supported archive directly under `src_dir` into `dest_root`
///
/// Fails with [`Error::SourceMissing`] before touching `dest_root` when
/// `src_dir` is absent. Individual archive failures are logged and recorded in
/// the report; they do not stop the run.
pub fn extract_all(src_dir: &Path, dest_root: &Path) -> Result<BatchReport> {
    if !src_dir.is_dir() {
        return Err(Error::SourceMissing {
            path: src_dir.to_path_buf(),
        });
    }

    std::fs::create_dir_all(dest_root).map_err(|e| Error::Config {
        message: format!(
            "failed to create destination {}: {}",
            dest_root.display(),
            e
        ),
        key: Some("dest_dir".to_string()),
    })?;

    let archives: Vec<ArchiveEntry> = scan(src_dir)?.collect();
    if archives.is_empty() {
        info!(?src_dir, "no supported archives found");
        return Ok(BatchReport::default());
    }

    info!(?src_dir, count = archives.len(), "found archives");

    let total = archives.len();
    let mut report = BatchReport::default();
    for (i, archive) in archives.into_iter().enumerate() {
        info!("[{}/{}] extracting {}", i + 1, total, archive.basename());
        let result = extract(&archive, dest_root);
        report.results.push((archive, result));
    }

    info!(
        ?dest_root,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "extraction run complete"
    );

    Ok(report)
}
