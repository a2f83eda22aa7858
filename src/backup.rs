use crate::error::DrivebakError;
use crate::layout::DestinationLayout;
use crate::progress::{CopyProgress, ProgressSink};
use crate::scan::{scan_sources, BackupTotals, FileEntry, ScanOptions, ScanResult, SkipStage, SkippedFile};
use crate::signal::CancelToken;
use crate::utils::{copy_timestamps, format_minutes_seconds, format_size, is_staging_name, temp_path_for};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy)]
pub struct CopyOptions {
    pub preserve_timestamps: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            preserve_timestamps: true,
        }
    }
}

#[derive(Debug)]
pub struct CopyReport {
    pub destination: PathBuf,
    pub totals: BackupTotals,
    pub copied_files: u64,
    pub copied_bytes: u64,
    /// Files that failed during the copy, in list order
    pub skipped: Vec<SkippedFile>,
    pub duration: Duration,
    /// Stopped early by an interrupt; everything counted as copied is complete
    pub interrupted: bool,
}

impl CopyReport {
    pub fn summary(&self) -> String {
        let state = if self.interrupted {
            "Backup interrupted"
        } else {
            "Backup complete"
        };
        let mut line = format!(
            "{state}: {}/{} files ({}) copied to {} in {}",
            self.copied_files,
            self.totals.files,
            format_size(self.copied_bytes),
            self.destination.display(),
            format_minutes_seconds(self.duration)
        );
        if !self.skipped.is_empty() {
            line.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        line
    }
}

/// Scan `roots` and copy every file found into `destination`
pub fn copy_sources(
    roots: &[PathBuf],
    destination: &Path,
    scan_options: &ScanOptions,
    options: &CopyOptions,
    cancel: &CancelToken,
    sink: &mut dyn ProgressSink,
) -> Result<CopyReport> {
    let scan = scan_sources(roots, scan_options);
    copy_scanned(&scan, destination, options, cancel, sink)
}

/// Copy the files of an existing scan into `destination`.
///
/// A file that cannot be copied is recorded in [`CopyReport::skipped`] and the run moves on.
/// The only error is a destination that is not an existing directory.
pub fn copy_scanned(
    scan: &ScanResult,
    destination: &Path,
    options: &CopyOptions,
    cancel: &CancelToken,
    sink: &mut dyn ProgressSink,
) -> Result<CopyReport> {
    if !destination.is_dir() {
        return Err(DrivebakError::DestinationNotDirectory {
            path: destination.to_path_buf(),
        });
    }

    let start_time = Instant::now();
    let layout = DestinationLayout::new(destination, &scan.roots);
    let totals = scan.totals();
    info!(
        files = totals.files,
        bytes = totals.bytes,
        destination = %destination.display(),
        "starting copy"
    );

    let _copying = cancel.begin_copy();
    let mut progress = CopyProgress::new(totals);
    let mut skipped = Vec::new();
    let mut interrupted = false;

    sink.start(&progress);

    for entry in &scan.entries {
        if cancel.is_interrupted() {
            interrupted = true;
            break;
        }

        let root = &scan.roots[entry.root_index];
        match copy_entry(entry, root, &layout, options) {
            Ok(bytes) => progress.record_file(bytes),
            Err(skip) => {
                debug!(path = %skip.path.display(), stage = %skip.stage, reason = %skip.reason, "file skipped");
                skipped.push(skip);
            }
        }
        sink.update(&progress);
    }

    sink.finish(&progress);

    let report = CopyReport {
        destination: destination.to_path_buf(),
        totals,
        copied_files: progress.copied_files,
        copied_bytes: progress.copied_bytes,
        skipped,
        duration: start_time.elapsed(),
        interrupted,
    };
    info!(
        copied = report.copied_files,
        skipped = report.skipped.len(),
        interrupted,
        "copy finished"
    );
    Ok(report)
}

/// Copy one file through a temporary sibling; returns the bytes written
fn copy_entry(
    entry: &FileEntry,
    root: &Path,
    layout: &DestinationLayout,
    options: &CopyOptions,
) -> std::result::Result<u64, SkippedFile> {
    let target_dir = layout.target_dir(root, entry.root_index, &entry.containing_dir);
    fs::create_dir_all(&target_dir).map_err(|e| skip(entry, SkipStage::CreateDirectory, e))?;

    let file_name = entry
        .path
        .file_name()
        .ok_or_else(|| skip(entry, SkipStage::Copy, "source has no file name"))?;
    let dest = target_dir.join(file_name);
    let temp = temp_path_for(&target_dir);

    let result = write_staged(entry, &temp, &dest, options);
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_staged(
    entry: &FileEntry,
    temp: &Path,
    dest: &Path,
    options: &CopyOptions,
) -> std::result::Result<u64, SkippedFile> {
    let bytes = fs::copy(&entry.path, temp).map_err(|e| skip(entry, SkipStage::Copy, e))?;

    if options.preserve_timestamps {
        let metadata = fs::metadata(&entry.path).map_err(|e| skip(entry, SkipStage::Timestamps, e))?;
        copy_timestamps(&metadata, temp).map_err(|e| skip(entry, SkipStage::Timestamps, e))?;
    }

    fs::rename(temp, dest).map_err(|e| skip(entry, SkipStage::Finalize, e))?;
    Ok(bytes)
}

fn skip(entry: &FileEntry, stage: SkipStage, reason: impl ToString) -> SkippedFile {
    SkippedFile {
        path: entry.path.clone(),
        stage,
        reason: reason.to_string(),
    }
}

/// Remove staging files left by a killed run from the destination folders `roots` map to.
///
/// Only the per-root subtrees of the layout are visited; the rest of the destination volume
/// is never walked.
pub fn cleanup_backup_staging(destination: &Path, roots: &[PathBuf]) -> Result<usize> {
    let layout = DestinationLayout::new(destination, roots);
    let mut dirs: Vec<PathBuf> = (0..roots.len()).map(|i| layout.root_dir(i)).collect();
    dirs.sort();
    dirs.dedup();

    let mut removed = 0;
    for dir in &dirs {
        removed += cleanup_temp_files(dir)?;
    }
    Ok(removed)
}

/// Remove staging files under `dir`; other files are left alone even if they look similar
pub fn cleanup_temp_files(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !is_staging_name(entry.file_name()) {
            continue;
        }
        if fs::remove_file(entry.path()).is_ok() {
            debug!(path = %entry.path().display(), "removed stale staging file");
            removed += 1;
        }
    }

    Ok(removed)
}
