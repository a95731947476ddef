//! Core types shared by the classifier, extractor, scanner and watcher

use crate::error::ExtractionError;
use crate::extraction::format;
use std::fmt;
use std::path::{Path, PathBuf};

/// Archive kind, derived from the file name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// ZIP container (`.zip`)
    Zip,
    /// Uncompressed tar (`.tar`)
    TarPlain,
    /// Gzip-compressed tar (`.tar.gz`, `.tgz`)
    TarGz,
    /// Bzip2-compressed tar (`.tar.bz2`, `.tbz2`)
    TarBz2,
    /// XZ-compressed tar (`.tar.xz`, `.txz`)
    TarXz,
    /// A single gzip-compressed file (`.gz`)
    GzSingle,
    /// A single bzip2-compressed file (`.bz2`)
    Bz2Single,
    /// Anything else
    Unsupported,
}

impl ArchiveKind {
    /// Whether the extractor can handle this kind
    pub fn is_supported(self) -> bool {
        self != ArchiveKind::Unsupported
    }

    /// Whether this kind is a tar container (possibly compressed)
    pub fn is_tar(self) -> bool {
        matches!(
            self,
            ArchiveKind::TarPlain | ArchiveKind::TarGz | ArchiveKind::TarBz2 | ArchiveKind::TarXz
        )
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::TarPlain => "tar",
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::TarBz2 => "tar.bz2",
            ArchiveKind::TarXz => "tar.xz",
            ArchiveKind::GzSingle => "gz",
            ArchiveKind::Bz2Single => "bz2",
            ArchiveKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// A file found in the source directory, classified by name
///
/// Fields are private so an entry can only come out of [`ArchiveEntry::classify`];
/// the kind always agrees with the basename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    path: PathBuf,
    basename: String,
    kind: ArchiveKind,
}

impl ArchiveEntry {
    /// Classify a path by its file name
    ///
    /// Returns `None` when the path has no UTF-8 file name. An unsupported
    /// name still yields an entry with [`ArchiveKind::Unsupported`].
    pub fn classify(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let basename = path.file_name()?.to_str()?.to_string();
        let kind = format::classify(&basename);
        Some(Self {
            path,
            basename,
            kind,
        })
    }

    /// Full path to the archive
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the archive
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Detected kind
    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    /// Basename with the archive suffix removed (`foo.tar.gz` -> `foo`)
    ///
    /// Unsupported names are returned unchanged.
    pub fn stem(&self) -> &str {
        format::split_archive_name(&self.basename)
            .map(|(stem, _, _)| stem)
            .unwrap_or(&self.basename)
    }

    /// Build the extraction target for this entry under `dest_root`
    pub fn target(&self, dest_root: &Path) -> ExtractionTarget {
        ExtractionTarget {
            destination_dir: dest_root.join(self.stem()),
            archive: self.clone(),
        }
    }
}

/// Where one archive is extracted to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionTarget {
    /// The archive being extracted
    pub archive: ArchiveEntry,
    /// `dest_root/<stem>`
    pub destination_dir: PathBuf,
}

/// Outcome of a single extraction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// Every member was written
    Success,
    /// Extraction stopped early; the destination must not be treated as complete
    Failure,
}

/// Result of extracting one archive
#[must_use]
#[derive(Debug)]
pub struct ExtractionResult {
    /// Success or failure
    pub status: ExtractionStatus,
    /// Directory the archive was (or would have been) extracted into
    pub dest_dir: PathBuf,
    /// Files written, in archive order
    pub files: Vec<PathBuf>,
    /// Failure cause, set when `status` is `Failure`
    pub error: Option<ExtractionError>,
}

impl ExtractionResult {
    pub(crate) fn success(dest_dir: PathBuf, files: Vec<PathBuf>) -> Self {
        Self {
            status: ExtractionStatus::Success,
            dest_dir,
            files,
            error: None,
        }
    }

    pub(crate) fn failure(dest_dir: PathBuf, error: ExtractionError) -> Self {
        Self {
            status: ExtractionStatus::Failure,
            dest_dir,
            files: Vec::new(),
            error: Some(error),
        }
    }

    /// Whether the extraction completed
    pub fn is_success(&self) -> bool {
        self.status == ExtractionStatus::Success
    }

    /// Convert into a `Result`, yielding the extracted files on success
    pub fn into_result(self) -> std::result::Result<Vec<PathBuf>, ExtractionError> {
        match (self.status, self.error) {
            (ExtractionStatus::Success, _) => Ok(self.files),
            (ExtractionStatus::Failure, Some(e)) => Err(e),
            (ExtractionStatus::Failure, None) => Err(ExtractionError::Corrupt {
                archive: self.dest_dir,
                reason: "extraction failed without a recorded cause".to_string(),
            }),
        }
    }
}
