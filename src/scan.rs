//! Read-only enumeration of the files under a set of source roots.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// A regular file discovered under one of the source roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Index into the root list the file was found under
    pub root_index: usize,
    /// Directory the file sits in (the root itself or one of its subdirectories)
    pub containing_dir: PathBuf,
    /// Size observed at scan time
    pub size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupTotals {
    pub files: u64,
    pub bytes: u64,
}

/// Where a file was dropped from the backup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipStage {
    Scan,
    CreateDirectory,
    Copy,
    Timestamps,
    Finalize,
}

impl fmt::Display for SkipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipStage::Scan => "scan",
            SkipStage::CreateDirectory => "create directory",
            SkipStage::Copy => "copy",
            SkipStage::Timestamps => "timestamps",
            SkipStage::Finalize => "finalize",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub stage: SkipStage,
    pub reason: String,
}

impl fmt::Display for SkippedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: {})", self.path.display(), self.stage, self.reason)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Descend into symlinked directories
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub roots: Vec<PathBuf>,
    pub entries: Vec<FileEntry>,
    pub skipped: Vec<SkippedFile>,
}

impl ScanResult {
    pub fn totals(&self) -> BackupTotals {
        BackupTotals {
            files: self.entries.len() as u64,
            bytes: self.entries.iter().map(|entry| entry.size).sum(),
        }
    }
}

/// Walk every root and collect its regular files.
///
/// Files whose metadata cannot be read are recorded in [`ScanResult::skipped`] and left out
/// of the entries and totals; nothing on disk is modified.
pub fn scan_sources(roots: &[PathBuf], options: &ScanOptions) -> ScanResult {
    let mut result = ScanResult {
        roots: roots.to_vec(),
        ..ScanResult::default()
    };

    for (root_index, root) in roots.iter().enumerate() {
        scan_root(root, root_index, options, &mut result);
    }

    debug!(
        files = result.entries.len(),
        skipped = result.skipped.len(),
        "scan finished"
    );
    result
}

fn scan_root(root: &Path, root_index: usize, options: &ScanOptions, result: &mut ScanResult) {
    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                result.skipped.push(SkippedFile {
                    path,
                    stage: SkipStage::Scan,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match file_size(&entry) {
            Ok(Some(size)) => {
                let path = entry.path().to_path_buf();
                let containing_dir = path.parent().unwrap_or(root).to_path_buf();
                result.entries.push(FileEntry {
                    path,
                    root_index,
                    containing_dir,
                    size,
                });
            }
            Ok(None) => {}
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "skipping file");
                result.skipped.push(SkippedFile {
                    path: entry.path().to_path_buf(),
                    stage: SkipStage::Scan,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Size of a regular file (or a link to one); `None` for directories and other entries
fn file_size(entry: &DirEntry) -> std::io::Result<Option<u64>> {
    let file_type = entry.file_type();

    if file_type.is_file() {
        return entry.metadata().map(|m| Some(m.len())).map_err(Into::into);
    }

    if file_type.is_symlink() {
        // Links are listed like files; the size is the target's
        let target = fs::metadata(entry.path())?;
        return Ok(target.is_file().then(|| target.len()));
    }

    Ok(None)
}
