use crate::error::ExtractionError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::shared::{create_member_dir, resolve_member_path, write_member};

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Open the archive and read its central directory
    fn open(archive_path: &Path) -> Result<zip::ZipArchive<std::fs::File>, ExtractionError> {
        let file =
            std::fs::File::open(archive_path).map_err(|e| ExtractionError::io(archive_path, e))?;

        zip::ZipArchive::new(file).map_err(|e| ExtractionError::Corrupt {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read ZIP archive: {}", e),
        })
    }

    /// Read a ZIP entry by index
    fn open_zip_entry<'a>(
        archive: &'a mut zip::ZipArchive<std::fs::File>,
        index: usize,
        archive_path: &Path,
    ) -> Result<zip::read::ZipFile<'a>, ExtractionError> {
        archive
            .by_index(index)
            .map_err(|e| ExtractionError::Corrupt {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to read ZIP entry {}: {}", index, e),
            })
    }

    /// Resolve every member path up front so a hostile entry aborts before anything is written
    fn resolve_all(
        archive: &mut zip::ZipArchive<std::fs::File>,
        archive_path: &Path,
        dest_path: &Path,
    ) -> Result<Vec<Option<PathBuf>>, ExtractionError> {
        (0..archive.len())
            .map(|i| {
                let file = Self::open_zip_entry(archive, i, archive_path)?;
                resolve_member_path(archive_path, dest_path, Path::new(file.name()))
            })
            .collect()
    }

    /// Extract every member of a ZIP archive into `dest_path`
    ///
    /// `dest_path` must already exist. Returns the files written.
    pub fn try_extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        let mut archive = Self::open(archive_path)?;
        let targets = Self::resolve_all(&mut archive, archive_path, dest_path)?;

        let mut extracted_files = Vec::new();

        for (i, target) in targets.into_iter().enumerate() {
            let Some(file_path) = target else {
                continue;
            };
            let mut file = Self::open_zip_entry(&mut archive, i, archive_path)?;

            if file.is_dir() {
                create_member_dir(&file_path)?;
            } else {
                write_member(archive_path, &mut file, &file_path)?;
                extracted_files.push(file_path);
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "ZIP extraction successful"
        );

        Ok(extracted_files)
    }
}
