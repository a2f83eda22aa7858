use drivebak::progress::PlainProgress;
use drivebak::resolve::source_roots;
use drivebak::{
    audit_space, copy_scanned, copy_sources, default_config, scan_sources, BackupTotals,
    CancelToken, CopyOptions, NoProgress, PathResolver, ProgressConfig, ScanOptions, Session,
    SessionOutcome, VolumeProbe, VolumeUsage,
};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const GIB: u64 = 1024 * 1024 * 1024;

struct FixedVolume(VolumeUsage);

impl VolumeProbe for FixedVolume {
    fn usage(&self, _path: &Path) -> std::io::Result<VolumeUsage> {
        Ok(self.0)
    }
}

fn write_file(path: &Path, size: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![b'x'; size]).unwrap();
}

/// Relative paths and contents of every file under `dir`, sorted
fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let content = fs::read(&path).unwrap();
                files.push((path.strip_prefix(dir).unwrap().to_path_buf(), content));
            }
        }
    }
    files.sort();
    files
}

fn home_with_pictures_and_documents() -> tempfile::TempDir {
    let home = tempdir().unwrap();
    write_file(&home.path().join("Pictures").join("beach.jpg"), 300);
    write_file(&home.path().join("Pictures").join("2023").join("party.jpg"), 500);
    write_file(&home.path().join("Documents").join("taxes.pdf"), 200);
    home
}

#[test]
fn test_resolved_folders_copy_into_separate_subtrees() {
    let home = home_with_pictures_and_documents();
    let dest = tempdir().unwrap();

    let resolver = PathResolver::new(home.path(), "OneDrive");
    let roots = source_roots(&resolver.resolve_all(&["Pictures", "Documents", "Music"]));
    assert_eq!(roots.len(), 2);

    let scan = scan_sources(&roots, &ScanOptions::default());
    assert_eq!(scan.totals(), BackupTotals { files: 3, bytes: 1000 });

    let report = copy_scanned(
        &scan,
        dest.path(),
        &CopyOptions::default(),
        &CancelToken::new(),
        &mut NoProgress,
    )
    .unwrap();

    assert_eq!(report.copied_files, 3);
    assert_eq!(report.copied_bytes, 1000);
    assert!(report.skipped.is_empty());
    assert!(!report.interrupted);

    let copied = snapshot(dest.path());
    let names: Vec<PathBuf> = copied.iter().map(|(path, _)| path.clone()).collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("Documents").join("taxes.pdf"),
            PathBuf::from("Pictures").join("2023").join("party.jpg"),
            PathBuf::from("Pictures").join("beach.jpg"),
        ]
    );
}

#[test]
fn test_cloud_sync_fallback_keeps_its_folder_name() {
    let home = tempdir().unwrap();
    let dest = tempdir().unwrap();
    write_file(&home.path().join("Desktop").join("note.txt"), 10);
    write_file(&home.path().join("OneDrive").join("Documents").join("cv.odt"), 20);

    let resolver = PathResolver::new(home.path(), "OneDrive");
    let roots = source_roots(&resolver.resolve_all(&["Desktop", "Documents"]));
    assert_eq!(roots[1], home.path().join("OneDrive").join("Documents"));

    let report = copy_sources(
        &roots,
        dest.path(),
        &ScanOptions::default(),
        &CopyOptions::default(),
        &CancelToken::new(),
        &mut NoProgress,
    )
    .unwrap();
    assert_eq!(report.copied_files, 2);

    let names: Vec<PathBuf> = snapshot(dest.path()).into_iter().map(|(p, _)| p).collect();
    assert!(names.contains(&PathBuf::from("Desktop").join("note.txt")));
    assert!(names.contains(&PathBuf::from("OneDrive").join("Documents").join("cv.odt")));
}

#[test]
fn test_repeated_backups_produce_identical_trees() {
    let home = home_with_pictures_and_documents();
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let roots = vec![home.path().join("Pictures"), home.path().join("Documents")];

    for dest in [first.path(), second.path()] {
        copy_sources(
            &roots,
            dest,
            &ScanOptions::default(),
            &CopyOptions::default(),
            &CancelToken::new(),
            &mut NoProgress,
        )
        .unwrap();
    }

    assert_eq!(snapshot(first.path()), snapshot(second.path()));
}

#[test]
fn test_rerun_overwrites_previous_backup() {
    let home = home_with_pictures_and_documents();
    let dest = tempdir().unwrap();
    let roots = vec![home.path().join("Documents")];
    write_file(&dest.path().join("Documents").join("taxes.pdf"), 5);

    let report = copy_sources(
        &roots,
        dest.path(),
        &ScanOptions::default(),
        &CopyOptions::default(),
        &CancelToken::new(),
        &mut NoProgress,
    )
    .unwrap();

    assert_eq!(report.copied_files, 1);
    let copied = fs::read(dest.path().join("Documents").join("taxes.pdf")).unwrap();
    assert_eq!(copied.len(), 200);
}

#[test]
fn test_empty_folder_reports_full_progress() {
    let home = tempdir().unwrap();
    let dest = tempdir().unwrap();
    fs::create_dir_all(home.path().join("Videos")).unwrap();
    let roots = vec![home.path().join("Videos")];

    let mut out = Vec::new();
    let report = {
        let mut sink = PlainProgress::new(&mut out, 10);
        copy_sources(
            &roots,
            dest.path(),
            &ScanOptions::default(),
            &CopyOptions::default(),
            &CancelToken::new(),
            &mut sink,
        )
        .unwrap()
    };

    assert_eq!(report.totals, BackupTotals::default());
    assert_eq!(report.copied_files, 0);
    assert!(report.summary().starts_with("Backup complete: 0/0 files"));
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[##########] 100.0% (0/0)"));
}

#[test]
fn test_space_shortfall_in_gib() {
    let dest = tempdir().unwrap();
    let probe = FixedVolume(VolumeUsage {
        total_bytes: 100 * GIB,
        free_bytes: 5 * GIB,
    });

    let report = audit_space(&probe, dest.path(), 12 * GIB).unwrap();
    assert!(!report.is_sufficient());
    assert_eq!(report.verdict_line(), "Not enough space. You are short by 7.00 GiB.");

    let exact = audit_space(&probe, dest.path(), 5 * GIB).unwrap();
    assert!(exact.is_sufficient());
}

#[test]
fn test_session_without_any_existing_folder() {
    let home = tempdir().unwrap();
    let config = default_config();
    let probe = FixedVolume(VolumeUsage {
        total_bytes: 10 * GIB,
        free_bytes: 10 * GIB,
    });
    let session = Session {
        config: &config,
        home: home.path().to_path_buf(),
        probe: &probe,
        inventory: None,
        progress: ProgressConfig::disabled(),
        cancel: CancelToken::new(),
    };

    let mut input = Cursor::new("Music, Movies\nn\n");
    let mut output = Vec::new();
    let outcome = session.run(&mut input, &mut output).unwrap();

    assert!(matches!(outcome, SessionOutcome::NoValidFolders));
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Folder \"Music\" not found, skipping"));
    assert!(text.contains("Folder \"Movies\" not found, skipping"));
    assert!(text.ends_with("No valid folders to back up.\n"));
}

#[test]
fn test_session_stops_when_input_closes() {
    let home = home_with_pictures_and_documents();
    let config = default_config();
    let probe = FixedVolume(VolumeUsage {
        total_bytes: 10 * GIB,
        free_bytes: 10 * GIB,
    });
    let session = Session {
        config: &config,
        home: home.path().to_path_buf(),
        probe: &probe,
        inventory: None,
        progress: ProgressConfig::disabled(),
        cancel: CancelToken::new(),
    };

    let mut input = Cursor::new("Pictures\nn\n");
    let mut output = Vec::new();
    let err = session.run(&mut input, &mut output).unwrap_err();
    assert_eq!(err.exit_code(), 1);
}
