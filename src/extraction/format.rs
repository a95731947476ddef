//! Archive classification by file name

use crate::types::ArchiveKind;

/// Recognized suffixes, longest first so `.tar.gz` wins over `.gz`
const SUFFIXES: &[(&str, ArchiveKind)] = &[
    (".tar.bz2", ArchiveKind::TarBz2),
    (".tar.gz", ArchiveKind::TarGz),
    (".tar.xz", ArchiveKind::TarXz),
    (".tbz2", ArchiveKind::TarBz2),
    (".tar", ArchiveKind::TarPlain),
    (".tgz", ArchiveKind::TarGz),
    (".txz", ArchiveKind::TarXz),
    (".zip", ArchiveKind::Zip),
    (".bz2", ArchiveKind::Bz2Single),
    (".gz", ArchiveKind::GzSingle),
];

/// Detect archive kind from a file name
///
/// Matching is ASCII case-insensitive and always takes the longest suffix, so a
/// `.gz` whose stem ends in `.tar` is a [`ArchiveKind::TarGz`]. A bare `.xz` is
/// unsupported; only `.tar.xz` is handled.
///
/// # Examples
///
/// ```
/// use archive_intake::extraction::classify;
/// use archive_intake::types::ArchiveKind;
///
/// assert_eq!(classify("case-2023.tar.gz"), ArchiveKind::TarGz);
/// assert_eq!(classify("case-2023.gz"), ArchiveKind::GzSingle);
/// assert_eq!(classify("notes.txt"), ArchiveKind::Unsupported);
/// ```
pub fn classify(basename: &str) -> ArchiveKind {
    split_archive_name(basename)
        .map(|(_, _, kind)| kind)
        .unwrap_or(ArchiveKind::Unsupported)
}

/// Split a file name into `(stem, suffix, kind)`
///
/// The suffix keeps its original casing. Returns `None` for unsupported names.
pub fn split_archive_name(basename: &str) -> Option<(&str, &str, ArchiveKind)> {
    // ASCII lowering keeps byte offsets identical to the original
    let lower = basename.to_ascii_lowercase();
    SUFFIXES
        .iter()
        .find(|(suffix, _)| lower.ends_with(suffix))
        .map(|(suffix, kind)| {
            let (stem, matched) = basename.split_at(basename.len() - suffix.len());
            (stem, matched, *kind)
        })
}
