use crate::error::ExtractionError;
use crate::types::ArchiveKind;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::shared::{create_member_dir, resolve_member_path, write_member};

/// Archive extractor for tar files, plain or compressed
pub struct TarExtractor;

impl TarExtractor {
    /// Wrap the raw file in the stream decoder for `kind`
    fn decoder(
        kind: ArchiveKind,
        archive_path: &Path,
        reader: BufReader<std::fs::File>,
    ) -> Result<Box<dyn Read>, ExtractionError> {
        match kind {
            ArchiveKind::TarPlain => Ok(Box::new(reader)),
            ArchiveKind::TarGz => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
            ArchiveKind::TarBz2 => Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader))),
            ArchiveKind::TarXz => Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(reader))),
            _ => Err(ExtractionError::UnsupportedFormat {
                archive: archive_path.to_path_buf(),
            }),
        }
    }

    fn corrupt(archive_path: &Path, e: std::io::Error) -> ExtractionError {
        ExtractionError::Corrupt {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read tar stream: {}", e),
        }
    }

    /// Stream-decode a tar archive into `dest_path`
    ///
    /// Members are resolved one at a time as the stream is read; a traversal
    /// attempt stops extraction at that member. Symlinks, hard links and special
    /// files are skipped.
    pub fn try_extract(
        kind: ArchiveKind,
        archive_path: &Path,
        dest_path: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        debug!(?archive_path, %kind, ?dest_path, "attempting tar extraction");

        let file =
            std::fs::File::open(archive_path).map_err(|e| ExtractionError::io(archive_path, e))?;
        let reader = Self::decoder(kind, archive_path, BufReader::new(file))?;
        let mut archive = tar::Archive::new(reader);

        let mut extracted_files = Vec::new();

        let entries = archive
            .entries()
            .map_err(|e| Self::corrupt(archive_path, e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| Self::corrupt(archive_path, e))?;
            let member = entry
                .path()
                .map_err(|e| Self::corrupt(archive_path, e))?
                .into_owned();

            let Some(file_path) = resolve_member_path(archive_path, dest_path, &member)? else {
                continue;
            };

            let entry_type = entry.header().entry_type();
            if entry_type.is_dir() {
                create_member_dir(&file_path)?;
            } else if entry_type.is_file() || entry_type.is_contiguous() {
                write_member(archive_path, &mut entry, &file_path)?;
                extracted_files.push(file_path);
            } else {
                warn!(
                    ?archive_path,
                    ?member,
                    ?entry_type,
                    "skipping non-regular tar member"
                );
            }
        }

        info!(
            ?archive_path,
            %kind,
            extracted_count = extracted_files.len(),
            "tar extraction successful"
        );

        Ok(extracted_files)
    }
}
