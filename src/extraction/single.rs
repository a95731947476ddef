use crate::error::ExtractionError;
use crate::types::ArchiveKind;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::shared::write_member;

/// Decompressor for single-file gzip and bzip2 streams
pub struct SingleFileExtractor;

impl SingleFileExtractor {
    /// Decompress `archive_path` into `dest_path/<output_name>`
    ///
    /// On a decode failure the partially written output is removed so a
    /// truncated file is never left looking complete.
    pub fn try_extract(
        kind: ArchiveKind,
        archive_path: &Path,
        output_name: &str,
        dest_path: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        debug!(?archive_path, %kind, ?dest_path, output_name, "attempting single-file decompression");

        let file =
            std::fs::File::open(archive_path).map_err(|e| ExtractionError::io(archive_path, e))?;
        let reader = BufReader::new(file);
        let mut decoder: Box<dyn Read> = match kind {
            ArchiveKind::GzSingle => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            ArchiveKind::Bz2Single => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            _ => {
                return Err(ExtractionError::UnsupportedFormat {
                    archive: archive_path.to_path_buf(),
                });
            }
        };

        let out_path = dest_path.join(output_name);
        match write_member(archive_path, &mut decoder, &out_path) {
            Ok(bytes) => {
                info!(?archive_path, ?out_path, bytes, "decompression successful");
                Ok(vec![out_path])
            }
            Err(e) => {
                if let Err(remove_err) = std::fs::remove_file(&out_path)
                    && remove_err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!(?out_path, error = %remove_err, "failed to remove partial output");
                }
                Err(e)
            }
        }
    }
}
