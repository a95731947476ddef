//! Configuration types for archive-intake

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
///
/// Loaded from JSON with [`Config::from_json_file`]; any field may be omitted
/// and falls back to its default. Command-line flags override file values.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where archives come from and where they are extracted to
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Polling watcher settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Config {
    /// Read a JSON configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or fails
    /// [`Config::validate`]
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.watch.interval.is_zero() {
            return Err(Error::Config {
                message: "watch interval must be greater than zero".to_string(),
                key: Some("interval".to_string()),
            });
        }

        if same_dir(&self.extraction.source_dir, &self.extraction.dest_dir) {
            return Err(Error::Config {
                message: "source and destination directories must differ".to_string(),
                key: Some("dest_dir".to_string()),
            });
        }

        // Processed archives must leave the watched folder
        if self.watch.after_process == AfterProcess::MoveToProcessed
            && same_dir(&self.extraction.source_dir, &self.processed_dir())
        {
            return Err(Error::Config {
                message: "processed directory must not be the source directory".to_string(),
                key: Some("processed_dir".to_string()),
            });
        }

        Ok(())
    }

    /// Directory processed archives are moved into
    ///
    /// Defaults to a `processed` folder inside the source directory. The scanner
    /// never descends into subdirectories, so moved archives are not seen again.
    pub fn processed_dir(&self) -> PathBuf {
        self.watch
            .processed_dir
            .clone()
            .unwrap_or_else(|| self.extraction.source_dir.join("processed"))
    }
}

/// Source and destination directories
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Directory archives are dropped into (default: "data")
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Root directory archives are extracted under (default: "archive")
    #[serde(default = "default_dest_dir")]
    pub dest_dir: PathBuf,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            dest_dir: default_dest_dir(),
        }
    }
}

/// Watcher configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Poll interval (default: 5 seconds)
    #[serde(default = "default_scan_interval", with = "duration_serde")]
    pub interval: Duration,

    /// Where archives go after processing (default: `<source_dir>/processed`)
    #[serde(default)]
    pub processed_dir: Option<PathBuf>,

    /// What to do with an archive after it was extracted
    #[serde(default)]
    pub after_process: AfterProcess,

    /// Re-trigger archives whose processing failed on the next poll (default: true)
    ///
    /// When false, a failed archive is only retried once it disappears from the
    /// source directory and reappears, or the watcher restarts.
    #[serde(default = "default_true")]
    pub retry_failed: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: default_scan_interval(),
            processed_dir: None,
            after_process: AfterProcess::default(),
            retry_failed: true,
        }
    }
}

/// Action to take with an archive after successful extraction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterProcess {
    /// Move into the processed directory (default)
    #[default]
    MoveToProcessed,
    /// Delete the archive
    Delete,
    /// Leave it in place; it is not re-triggered while the watcher keeps running
    Keep,
}

/// Whether two directory settings point at the same place
///
/// Existing directories are compared after canonicalisation. Missing ones are
/// made absolute and stripped of `.` components.
fn same_dir(a: &Path, b: &Path) -> bool {
    normalize_dir(a) == normalize_dir(b)
}

fn normalize_dir(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_dest_dir() -> PathBuf {
    PathBuf::from("archive")
}

fn default_scan_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
