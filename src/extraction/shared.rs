use crate::error::ExtractionError;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Resolve an archive member path against `dest_dir`
///
/// Rejects absolute paths, drive prefixes and any `..` that climbs above
/// `dest_dir`. A `..` that stays inside (e.g. `a/../b`) is folded away.
/// Returns `Ok(None)` for members that resolve to `dest_dir` itself (`./`).
pub(crate) fn resolve_member_path(
    archive_path: &Path,
    dest_dir: &Path,
    member: &Path,
) -> Result<Option<PathBuf>, ExtractionError> {
    let traversal = || ExtractionError::PathTraversal {
        archive: archive_path.to_path_buf(),
        entry: member.to_path_buf(),
    };

    let mut relative = PathBuf::new();
    let mut depth = 0usize;
    for component in member.components() {
        match component {
            Component::Normal(part) => {
                relative.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(traversal());
                }
                relative.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return Err(traversal()),
        }
    }

    if depth == 0 {
        return Ok(None);
    }
    Ok(Some(dest_dir.join(relative)))
}

/// Create the destination directory (and parents), reusing it if present
pub(crate) fn prepare_dest_dir(dest_dir: &Path) -> Result<(), ExtractionError> {
    std::fs::create_dir_all(dest_dir).map_err(|e| ExtractionError::io(dest_dir, e))
}

/// Create a directory member
pub(crate) fn create_member_dir(path: &Path) -> Result<(), ExtractionError> {
    std::fs::create_dir_all(path).map_err(|e| ExtractionError::io(path, e))
}

/// Write a file member, creating parent directories and truncating any previous copy
///
/// Read errors are reported as a corrupt archive; everything else is an I/O
/// error on the output path.
pub(crate) fn write_member<R: Read + ?Sized>(
    archive_path: &Path,
    reader: &mut R,
    path: &Path,
) -> Result<u64, ExtractionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExtractionError::io(parent, e))?;
    }

    let mut outfile = std::fs::File::create(path).map_err(|e| ExtractionError::io(path, e))?;
    copy_stream(archive_path, reader, &mut outfile, path)
}

/// Copy a decoded stream into `out`, classifying failures by which side failed
fn copy_stream<R: Read + ?Sized, W: std::io::Write>(
    archive_path: &Path,
    reader: &mut R,
    out: &mut W,
    out_path: &Path,
) -> Result<u64, ExtractionError> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ExtractionError::Corrupt {
                    archive: archive_path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };
        out.write_all(&buf[..n])
            .map_err(|e| ExtractionError::io(out_path, e))?;
        written += n as u64;
    }
    Ok(written)
}

/// Remove `dest_dir` if a failed extraction left it empty
///
/// Non-empty directories are left alone; the caller already reports the failure.
pub(crate) fn remove_if_empty(dest_dir: &Path) {
    let is_empty = match std::fs::read_dir(dest_dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => return,
    };

    if is_empty {
        match std::fs::remove_dir(dest_dir) {
            Ok(()) => debug!(?dest_dir, "removed empty destination after failed extraction"),
            Err(e) => warn!(?dest_dir, error = %e, "failed to remove empty destination"),
        }
    }
}
