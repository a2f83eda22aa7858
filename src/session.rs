//! The interactive backup flow: folder selection, destination, space check, copy, report.

use crate::backup::{cleanup_backup_staging, copy_scanned, CopyOptions, CopyReport};
use crate::config::Config;
use crate::progress::{create_progress_sink, ProgressConfig};
use crate::prompt::{ask_line, ask_yes_no, clean_destination, parse_folder_list};
use crate::report::{write_report, SoftwareInventory};
use crate::resolve::{source_roots, PathResolver};
use crate::scan::{scan_sources, ScanOptions, ScanResult};
use crate::signal::CancelToken;
use crate::space::{audit_space, SpaceReport, VolumeProbe};
use crate::utils::{format_count, format_gib};
use crate::Result;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How a session ended. Every variant is a normal termination.
#[derive(Debug)]
pub enum SessionOutcome {
    NoValidFolders,
    DestinationDeclined,
    InsufficientSpace(SpaceReport),
    Declined(SpaceReport),
    Completed {
        report: CopyReport,
        manifest: Option<PathBuf>,
    },
}

pub struct Session<'a> {
    pub config: &'a Config,
    /// Base directory folder names are resolved against
    pub home: PathBuf,
    pub probe: &'a dyn VolumeProbe,
    /// `None` skips the installed-software manifest
    pub inventory: Option<&'a dyn SoftwareInventory>,
    pub progress: ProgressConfig,
    pub cancel: CancelToken,
}

impl<'a> Session<'a> {
    pub fn run<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<SessionOutcome> {
        let roots = self.select_sources(input, output)?;
        if roots.is_empty() {
            writeln!(output, "No valid folders to back up.")?;
            return Ok(SessionOutcome::NoValidFolders);
        }

        let destination = match self.select_destination(input, output)? {
            Some(destination) => destination,
            None => {
                writeln!(output, "Backup canceled.")?;
                return Ok(SessionOutcome::DestinationDeclined);
            }
        };

        let scan = scan_sources(
            &roots,
            &ScanOptions {
                follow_symlinks: self.config.follow_symlinks,
            },
        );
        let totals = scan.totals();
        let space = audit_space(self.probe, &destination, totals.bytes)?;
        self.print_summary(output, &scan, &space)?;

        if !space.is_sufficient() {
            info!(required = space.required_bytes, "not enough space, stopping");
            return Ok(SessionOutcome::InsufficientSpace(space));
        }

        if !ask_yes_no(input, output, "Continue with the backup?")? {
            writeln!(output, "Backup canceled by user.")?;
            return Ok(SessionOutcome::Declined(space));
        }

        let stale = cleanup_backup_staging(&destination, &scan.roots)?;
        if stale > 0 {
            info!(stale, "removed staging files from an earlier run");
        }

        let report = self.copy_with_progress(&scan, &destination, output)?;
        writeln!(output, "{}", report.summary())?;
        for skipped in &report.skipped {
            writeln!(output, "  skipped: {skipped}")?;
        }

        let manifest = if report.interrupted {
            None
        } else {
            self.write_manifest(&destination, output)?
        };

        Ok(SessionOutcome::Completed { report, manifest })
    }

    fn select_sources<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<Vec<PathBuf>> {
        let mut names = parse_folder_list(&ask_line(
            input,
            output,
            "Enter the folders you want to back up (e.g. Pictures, Videos): ",
        )?);

        if !self.config.common_folders.is_empty() {
            let question = format!(
                "Also back up common folders ({})?",
                self.config.common_folders.join(", ")
            );
            if ask_yes_no(input, output, &question)? {
                names.extend(parse_folder_list(&ask_line(
                    input,
                    output,
                    "Which ones? (e.g. Desktop, Documents): ",
                )?));
            }
        }

        let resolver = PathResolver::new(&self.home, &self.config.cloud_sync_folder);
        let resolutions = resolver.resolve_all(&names);
        for resolution in &resolutions {
            writeln!(output, "{}", resolution.status_line())?;
        }

        let roots = source_roots(&resolutions);
        if !roots.is_empty() {
            writeln!(output, "\nFolders to back up:")?;
            for root in &roots {
                writeln!(output, "  {}", root.display())?;
            }
        }
        Ok(roots)
    }

    /// Ask until a usable destination is given; `None` when the user refuses to create it
    fn select_destination<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<PathBuf>> {
        loop {
            let answer = ask_line(
                input,
                output,
                "\nEnter the destination path (quotes from \"Copy as path\" are fine): ",
            )?;
            let Some(destination) = clean_destination(&answer) else {
                writeln!(output, "Please enter a destination path.")?;
                continue;
            };

            if destination.is_dir() {
                return Ok(Some(destination));
            }
            if destination.exists() {
                writeln!(
                    output,
                    "{} is not a folder, please choose another path.",
                    destination.display()
                )?;
                continue;
            }

            if !ask_yes_no(input, output, "Destination folder does not exist. Create it?")? {
                return Ok(None);
            }
            fs::create_dir_all(&destination)?;
            info!(path = %destination.display(), "created destination");
            return Ok(Some(destination));
        }
    }

    fn print_summary<W: Write>(&self, output: &mut W, scan: &ScanResult, space: &SpaceReport) -> Result<()> {
        let totals = scan.totals();
        writeln!(output, "\nBackup summary:")?;
        writeln!(output, "  Files to back up: {}", format_count(totals.files))?;
        writeln!(output, "  Size needed:      {}", format_gib(totals.bytes))?;
        writeln!(output, "  Destination:      {}", space.destination.display())?;
        writeln!(output, "  Total space:      {}", format_gib(space.usage.total_bytes))?;
        writeln!(output, "  Free space:       {}", format_gib(space.usage.free_bytes))?;
        if !scan.skipped.is_empty() {
            writeln!(
                output,
                "  Unreadable:       {} entries will be skipped",
                format_count(scan.skipped.len() as u64)
            )?;
        }
        writeln!(output, "{}", space.verdict_line())?;
        Ok(())
    }

    fn copy_with_progress<W: Write>(
        &self,
        scan: &ScanResult,
        destination: &Path,
        output: &mut W,
    ) -> Result<CopyReport> {
        let options = CopyOptions {
            preserve_timestamps: self.config.preserve_timestamps,
        };

        let mut sink = create_progress_sink(&self.progress, &mut *output);
        copy_scanned(scan, destination, &options, &self.cancel, sink.as_mut())
    }

    /// A failing inventory only produces a warning; the copied files stand
    fn write_manifest<W: Write>(&self, destination: &Path, output: &mut W) -> Result<Option<PathBuf>> {
        let Some(inventory) = self.inventory.filter(|_| self.config.write_report) else {
            return Ok(None);
        };

        match write_report(inventory, destination, &self.config.report_file_name) {
            Ok(path) => {
                writeln!(output, "Installed programs list saved to {}", path.display())?;
                Ok(Some(path))
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(error = %reason, "installed programs list not written");
                writeln!(output, "Warning: could not write the installed programs list: {reason}")?;
                Ok(None)
            }
        }
    }
}
