//! Utility functions for file operations and path manipulation

use crate::error::{Error, Result};
use crate::extraction::split_archive_name;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Get a path in `dir` for `file_name` that does not exist yet
///
/// If `dir/file_name` is free it is returned unchanged. Otherwise a counter is
/// inserted before the archive suffix, so multi-part suffixes stay intact:
/// `case.tar.gz` becomes `case (1).tar.gz`, then `case (2).tar.gz`, and so on.
///
/// # Examples
///
/// ```
/// use archive_intake::utils::get_unique_path;
/// use std::path::Path;
///
/// let dir = Path::new("/tmp/definitely-not-here");
/// let unique = get_unique_path(dir, "case.tar.gz").unwrap();
/// assert_eq!(unique, dir.join("case.tar.gz"));
/// ```
pub fn get_unique_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    if !path.exists() {
        return Ok(path);
    }

    let (stem, suffix) = match split_archive_name(file_name) {
        Some((stem, suffix, _)) => (stem, suffix),
        None => match file_name.rfind('.') {
            Some(dot) if dot > 0 => file_name.split_at(dot),
            _ => (file_name, ""),
        },
    };

    // Try adding (1), (2), (3), ... until we find a unique name
    for i in 1..=MAX_RENAME_ATTEMPTS {
        let new_path = dir.join(format!("{} ({}){}", stem, i, suffix));
        if !new_path.exists() {
            return Ok(new_path);
        }
    }

    Err(Error::Relocation {
        path,
        reason: format!(
            "could not find unique filename after {} attempts",
            MAX_RENAME_ATTEMPTS
        ),
    })
}
