use crate::error::{Error, ExtractionError};
use crate::extraction::*;
use crate::types::{ArchiveEntry, ArchiveKind, ExtractionStatus};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SAMPLE: &[(&str, &[u8])] = &[("a.txt", b"hello"), ("b/c.txt", b"world")];

/// Create a valid ZIP archive containing multiple files
fn create_zip_archive_multi(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Build an uncompressed tar stream from `(name, content)` pairs
///
/// Names are written into the raw header so hostile paths like `../x` survive.
fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ::tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = ::tar::Header::new_gnu();
        let raw = name.as_bytes();
        header.as_old_mut().name[..raw.len()].copy_from_slice(raw);
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(::tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, *content).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Write a tar archive compressed according to `kind`
fn create_tar_archive(archive_path: &Path, kind: ArchiveKind, files: &[(&str, &[u8])]) {
    let data = tar_bytes(files);
    let file = std::fs::File::create(archive_path).unwrap();
    match kind {
        ArchiveKind::TarPlain => {
            let mut file = file;
            file.write_all(&data).unwrap();
        }
        ArchiveKind::TarGz => {
            let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            enc.write_all(&data).unwrap();
            enc.finish().unwrap();
        }
        ArchiveKind::TarBz2 => {
            let mut enc = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
            enc.write_all(&data).unwrap();
            enc.finish().unwrap();
        }
        ArchiveKind::TarXz => {
            let mut enc = xz2::write::XzEncoder::new(file, 6);
            enc.write_all(&data).unwrap();
            enc.finish().unwrap();
        }
        other => panic!("not a tar kind: {other}"),
    }
}

fn create_gz(archive_path: &Path, content: &[u8]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    enc.write_all(content).unwrap();
    enc.finish().unwrap();
}

fn create_bz2(archive_path: &Path, content: &[u8]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut enc = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
    enc.write_all(content).unwrap();
    enc.finish().unwrap();
}

/// All regular files under `root`, relative and sorted
fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Top-level names directly under `dir`, sorted
fn top_level(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn sandbox() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("data");
    let dest = temp_dir.path().join("archive");
    std::fs::create_dir_all(&src).unwrap();
    (temp_dir, src, dest)
}

fn assert_sample_extracted(dest_dir: &Path) {
    assert_eq!(std::fs::read_to_string(dest_dir.join("a.txt")).unwrap(), "hello");
    assert_eq!(
        std::fs::read_to_string(dest_dir.join("b").join("c.txt")).unwrap(),
        "world"
    );
    assert_eq!(top_level(dest_dir), vec!["a.txt", "b"]);
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn zip_round_trip() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("case.zip");
    create_zip_archive_multi(&archive, SAMPLE);

    let entry = ArchiveEntry::classify(&archive).unwrap();
    let result = extract(&entry, &dest);

    assert_eq!(result.status, ExtractionStatus::Success);
    assert_eq!(result.dest_dir, dest.join("case"));
    assert_eq!(result.files.len(), 2);
    assert_sample_extracted(&dest.join("case"));
}

#[test]
fn tar_round_trip_for_every_codec() {
    let (_tmp, src, dest) = sandbox();
    for (name, kind) in [
        ("plain.tar", ArchiveKind::TarPlain),
        ("gz.tar.gz", ArchiveKind::TarGz),
        ("tgz.tgz", ArchiveKind::TarGz),
        ("bz.tar.bz2", ArchiveKind::TarBz2),
        ("tbz.tbz2", ArchiveKind::TarBz2),
        ("xz.tar.xz", ArchiveKind::TarXz),
        ("txz.txz", ArchiveKind::TarXz),
    ] {
        let archive = src.join(name);
        create_tar_archive(&archive, kind, SAMPLE);

        let entry = ArchiveEntry::classify(&archive).unwrap();
        assert_eq!(entry.kind(), kind, "{name}");

        let files = try_extract(&entry, &dest).unwrap();
        assert_eq!(files.len(), 2, "{name}");
        assert_sample_extracted(&dest.join(entry.stem()));
    }
}

#[test]
fn zip_directory_entries_are_created() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("dirs.zip");
    let file = std::fs::File::create(&archive).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options = ::zip::write::FileOptions::default();
    writer.add_directory("empty/", options).unwrap();
    writer.start_file("empty/../top.txt", options).unwrap();
    writer.write_all(b"top").unwrap();
    writer.finish().unwrap();

    let files = try_extract(&ArchiveEntry::classify(&archive).unwrap(), &dest).unwrap();

    assert_eq!(files, vec![dest.join("dirs").join("top.txt")]);
    assert!(dest.join("dirs").join("empty").is_dir());
}

#[test]
fn gz_single_file_decompresses_into_dest_dir() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("case-2023.xlsx.gz");
    create_gz(&archive, b"spreadsheet bytes");

    let entry = ArchiveEntry::classify(&archive).unwrap();
    assert_eq!(entry.kind(), ArchiveKind::GzSingle);
    let files = try_extract(&entry, &dest).unwrap();

    let out = dest.join("case-2023.xlsx").join("case-2023.xlsx");
    assert_eq!(files, vec![out.clone()]);
    assert_eq!(std::fs::read(&out).unwrap(), b"spreadsheet bytes");
    assert_eq!(top_level(&dest.join("case-2023.xlsx")), vec!["case-2023.xlsx"]);
}

#[test]
fn bz2_single_file_decompresses_into_dest_dir() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("notes.BZ2");
    create_bz2(&archive, b"compressed notes");

    let entry = ArchiveEntry::classify(&archive).unwrap();
    assert_eq!(entry.kind(), ArchiveKind::Bz2Single);
    try_extract(&entry, &dest).unwrap();

    assert_eq!(
        std::fs::read(dest.join("notes").join("notes")).unwrap(),
        b"compressed notes"
    );
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn re_extraction_is_idempotent() {
    let (_tmp, src, dest) = sandbox();
    let zip = src.join("twice.zip");
    let tgz = src.join("again.tar.gz");
    create_zip_archive_multi(&zip, SAMPLE);
    create_tar_archive(&tgz, ArchiveKind::TarGz, SAMPLE);

    for archive in [&zip, &tgz] {
        let entry = ArchiveEntry::classify(archive).unwrap();
        try_extract(&entry, &dest).unwrap();
        let first = files_under(&dest);
        try_extract(&entry, &dest).unwrap();
        assert_eq!(files_under(&dest), first);
    }

    assert_eq!(top_level(&dest), vec!["again", "twice"]);
    assert_sample_extracted(&dest.join("twice"));
    assert_sample_extracted(&dest.join("again"));
}

#[test]
fn re_extraction_overwrites_stale_content() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("case.zip");
    create_zip_archive_multi(&archive, SAMPLE);
    std::fs::create_dir_all(dest.join("case")).unwrap();
    std::fs::write(dest.join("case").join("a.txt"), "stale and longer").unwrap();

    try_extract(&ArchiveEntry::classify(&archive).unwrap(), &dest).unwrap();

    assert_eq!(
        std::fs::read_to_string(dest.join("case").join("a.txt")).unwrap(),
        "hello"
    );
}

// ---------------------------------------------------------------------------
// Path traversal
// ---------------------------------------------------------------------------

#[test]
fn zip_traversal_is_rejected_before_writing() {
    let (tmp, src, dest) = sandbox();
    let archive = src.join("evil.zip");
    create_zip_archive_multi(
        &archive,
        &[("ok.txt", b"fine"), ("../../evil.txt", b"pwned")],
    );

    let entry = ArchiveEntry::classify(&archive).unwrap();
    let result = extract(&entry, &dest);

    assert_eq!(result.status, ExtractionStatus::Failure);
    assert!(matches!(
        result.error,
        Some(ExtractionError::PathTraversal { .. })
    ));
    assert!(!tmp.path().join("evil.txt").exists());
    assert!(!dest.join("evil").exists(), "nothing should be written");
    assert_eq!(files_under(tmp.path()), vec![PathBuf::from("data/evil.zip")]);
}

#[test]
fn zip_absolute_member_is_rejected() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("abs.zip");
    create_zip_archive_multi(&archive, &[("/tmp/abs-evil.txt", b"pwned")]);

    let err = try_extract(&ArchiveEntry::classify(&archive).unwrap(), &dest).unwrap_err();
    assert!(matches!(err, ExtractionError::PathTraversal { .. }));
}

#[test]
fn tar_traversal_is_rejected() {
    let (tmp, src, dest) = sandbox();
    let archive = src.join("evil.tar.gz");
    create_tar_archive(&archive, ArchiveKind::TarGz, &[("../../evil.txt", b"pwned")]);

    let entry = ArchiveEntry::classify(&archive).unwrap();
    let result = extract(&entry, &dest);

    assert_eq!(result.status, ExtractionStatus::Failure);
    assert!(matches!(
        result.error,
        Some(ExtractionError::PathTraversal { .. })
    ));
    assert!(!tmp.path().join("evil.txt").exists());
    // The destination stayed empty, so it was cleaned up
    assert!(!dest.join("evil").exists());
}

#[test]
fn tar_traversal_after_valid_members_keeps_partial_output_but_fails() {
    let (tmp, src, dest) = sandbox();
    let archive = src.join("mixed.tar");
    create_tar_archive(
        &archive,
        ArchiveKind::TarPlain,
        &[("good.txt", b"good"), ("../escape.txt", b"bad")],
    );

    let result = extract(&ArchiveEntry::classify(&archive).unwrap(), &dest);

    assert!(!result.is_success());
    assert!(dest.join("mixed").join("good.txt").exists());
    assert!(!dest.join("escape.txt").exists());
    assert!(!tmp.path().join("escape.txt").exists());
}

#[cfg(unix)]
#[test]
fn tar_symlinks_are_skipped() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("links.tar");

    let mut builder = ::tar::Builder::new(Vec::new());
    let mut header = ::tar::Header::new_gnu();
    header.set_entry_type(::tar::EntryType::Symlink);
    header.set_size(0);
    builder
        .append_link(&mut header, "passwd", "/etc/passwd")
        .unwrap();
    let mut header = ::tar::Header::new_gnu();
    header.set_size(4);
    header.set_mode(0o644);
    builder
        .append_data(&mut header, "real.txt", &b"real"[..])
        .unwrap();
    std::fs::write(&archive, builder.into_inner().unwrap()).unwrap();

    let files = try_extract(&ArchiveEntry::classify(&archive).unwrap(), &dest).unwrap();

    assert_eq!(files, vec![dest.join("links").join("real.txt")]);
    assert!(std::fs::symlink_metadata(dest.join("links").join("passwd")).is_err());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn unsupported_format_does_not_touch_filesystem() {
    let (_tmp, src, dest) = sandbox();
    let file = src.join("notes.txt");
    std::fs::write(&file, "plain text").unwrap();

    let result = extract(&ArchiveEntry::classify(&file).unwrap(), &dest);

    assert_eq!(result.status, ExtractionStatus::Failure);
    assert!(matches!(
        result.error,
        Some(ExtractionError::UnsupportedFormat { .. })
    ));
    assert!(!dest.exists());
}

#[test]
fn bare_xz_is_unsupported() {
    let (_tmp, src, dest) = sandbox();
    let file = src.join("dump.xz");
    std::fs::write(&file, b"").unwrap();

    let err = try_extract(&ArchiveEntry::classify(&file).unwrap(), &dest).unwrap_err();
    assert!(matches!(err, ExtractionError::UnsupportedFormat { .. }));
    assert!(!dest.exists());
}

#[test]
fn suffix_only_name_is_rejected() {
    let (_tmp, src, dest) = sandbox();
    let file = src.join(".gz");
    create_gz(&file, b"x");

    let err = try_extract(&ArchiveEntry::classify(&file).unwrap(), &dest).unwrap_err();
    assert!(matches!(err, ExtractionError::InvalidName { .. }));
    assert!(!dest.exists());
}

#[test]
fn dot_stems_are_rejected() {
    let (tmp, src, dest) = sandbox();
    let zip_dot = src.join("..zip");
    let zip_dotdot = src.join("...zip");
    let tgz_dotdot = src.join("...tar.gz");
    create_zip_archive_multi(&zip_dot, SAMPLE);
    create_zip_archive_multi(&zip_dotdot, SAMPLE);
    create_tar_archive(&tgz_dotdot, ArchiveKind::TarGz, SAMPLE);

    for archive in [&zip_dot, &zip_dotdot, &tgz_dotdot] {
        let result = extract(&ArchiveEntry::classify(archive).unwrap(), &dest);
        assert!(
            matches!(result.error, Some(ExtractionError::InvalidName { .. })),
            "{} should be rejected",
            archive.display()
        );
    }

    assert!(!dest.exists());
    assert_eq!(top_level(tmp.path()), vec!["data"]);
}

#[test]
fn extract_all_never_writes_above_dest_for_dot_names() {
    let (tmp, src, dest) = sandbox();
    create_zip_archive_multi(&src.join("...zip"), SAMPLE);
    create_zip_archive_multi(&src.join("ok.zip"), SAMPLE);

    let report = extract_all(&src, &dest).unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(top_level(tmp.path()), vec!["archive", "data"]);
    assert_eq!(top_level(&dest), vec!["ok"]);
}

#[test]
fn corrupt_zip_fails_and_cleans_up_empty_dir() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("broken.zip");
    std::fs::write(&archive, b"PK\x03\x04 definitely truncated").unwrap();

    let result = extract(&ArchiveEntry::classify(&archive).unwrap(), &dest);

    assert!(!result.is_success());
    assert!(matches!(result.error, Some(ExtractionError::Corrupt { .. })));
    assert!(!dest.join("broken").exists());
    assert!(archive.exists(), "source archive must never be removed");
}

#[test]
fn corrupt_gz_removes_partial_output() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("broken.csv.gz");
    std::fs::write(&archive, b"\x1f\x8b\x08\x00 not really gzip").unwrap();

    let result = extract(&ArchiveEntry::classify(&archive).unwrap(), &dest);

    assert!(!result.is_success());
    assert!(matches!(result.error, Some(ExtractionError::Corrupt { .. })));
    assert!(!dest.join("broken.csv").exists());
}

#[test]
fn mislabelled_tar_is_corrupt() {
    let (_tmp, src, dest) = sandbox();
    let archive = src.join("fake.tar.xz");
    std::fs::write(&archive, b"this is not xz data at all").unwrap();

    let err = try_extract(&ArchiveEntry::classify(&archive).unwrap(), &dest).unwrap_err();
    assert!(matches!(err, ExtractionError::Corrupt { .. }));
}

#[test]
fn missing_archive_is_an_io_error() {
    let (_tmp, src, dest) = sandbox();
    let entry = ArchiveEntry::classify(src.join("vanished.tar")).unwrap();

    let err = try_extract(&entry, &dest).unwrap_err();
    assert!(matches!(err, ExtractionError::Io { .. }));
    assert!(!dest.join("vanished").exists());
}

// ---------------------------------------------------------------------------
// One-shot batch
// ---------------------------------------------------------------------------

#[test]
fn extract_all_missing_source_creates_nothing() {
    let (tmp, _src, dest) = sandbox();
    let missing = tmp.path().join("nope");

    let err = extract_all(&missing, &dest).unwrap_err();

    assert!(matches!(err, Error::SourceMissing { .. }));
    assert!(err.is_fatal());
    assert!(!dest.exists());
}

#[test]
fn extract_all_continues_past_failures() {
    let (_tmp, src, dest) = sandbox();
    create_zip_archive_multi(&src.join("good.zip"), SAMPLE);
    std::fs::write(src.join("bad.zip"), b"garbage").unwrap();
    create_tar_archive(&src.join("also-good.tar.bz2"), ArchiveKind::TarBz2, SAMPLE);
    std::fs::write(src.join("readme.txt"), b"ignored").unwrap();

    let report = extract_all(&src, &dest).unwrap();

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_sample_extracted(&dest.join("good"));
    assert_sample_extracted(&dest.join("also-good"));
    assert_eq!(top_level(&dest), vec!["also-good", "good"]);
    // Sources are left where they were
    assert!(src.join("good.zip").exists());
}

#[test]
fn extract_all_with_no_archives_still_creates_dest() {
    let (_tmp, src, dest) = sandbox();
    std::fs::write(src.join("readme.txt"), b"ignored").unwrap();

    let report = extract_all(&src, &dest).unwrap();

    assert!(report.is_empty());
    assert!(dest.is_dir());
}
