//! Error types for archive-intake
//!
//! Errors fall into three groups:
//! - Configuration errors (missing source directory, invalid settings) are fatal
//! - Extraction errors are scoped to a single archive and recoverable by the watcher
//! - Relocation errors happen after a successful extraction and are also per-archive

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for archive-intake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for archive-intake
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "interval")
        key: Option<String>,
    },

    /// The source directory does not exist or is not a directory
    #[error("source directory not found: {}", path.display())]
    SourceMissing {
        /// The directory that was expected to exist
        path: PathBuf,
    },

    /// Extraction of a single archive failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Moving or deleting a processed archive failed
    #[error("failed to relocate {}: {reason}", path.display())]
    Relocation {
        /// The archive that could not be relocated
        path: PathBuf,
        /// The reason relocation failed
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (configuration files)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error should stop the process rather than be logged and skipped
    ///
    /// Only configuration problems are fatal. Everything scoped to a single archive
    /// is retried on a later poll.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config { .. } | Error::SourceMissing { .. })
    }

    /// Short machine-readable code for structured log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::SourceMissing { .. } => "source_missing",
            Error::Extraction(e) => e.error_code(),
            Error::Relocation { .. } => "relocation_failed",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}

/// Errors raised while extracting one archive
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The file name does not match any supported archive suffix
    #[error("unsupported archive format: {}", archive.display())]
    UnsupportedFormat {
        /// The archive that was rejected
        archive: PathBuf,
    },

    /// The archive name has nothing left once its suffix is stripped (e.g. `.gz`)
    #[error("archive name {} has an empty stem", archive.display())]
    InvalidName {
        /// The archive that was rejected
        archive: PathBuf,
    },

    /// A member path would land outside the destination directory
    #[error("entry {} in {} escapes the destination directory", entry.display(), archive.display())]
    PathTraversal {
        /// The archive containing the offending member
        archive: PathBuf,
        /// The member path as stored in the archive
        entry: PathBuf,
    },

    /// The archive could not be decoded
    #[error("corrupt archive {}: {reason}", archive.display())]
    Corrupt {
        /// The archive that failed to decode
        archive: PathBuf,
        /// Decoder error message
        reason: String,
    },

    /// Filesystem error while reading the archive or writing its contents
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The blocking extraction task panicked or was cancelled
    #[error("extraction task for {} failed: {reason}", archive.display())]
    TaskFailed {
        /// The archive being extracted
        archive: PathBuf,
        /// Join error message
        reason: String,
    },
}

impl ExtractionError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExtractionError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable code for structured log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            ExtractionError::UnsupportedFormat { .. } => "unsupported_format",
            ExtractionError::InvalidName { .. } => "invalid_name",
            ExtractionError::PathTraversal { .. } => "path_traversal",
            ExtractionError::Corrupt { .. } => "corrupt_archive",
            ExtractionError::Io { .. } => "extraction_io_error",
            ExtractionError::TaskFailed { .. } => "task_failed",
        }
    }
}
