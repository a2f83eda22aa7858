//! Installed-software manifest written next to the backup.

use anyhow::{bail, Context};
use chrono::Local;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Lists the software installed on this host
pub trait SoftwareInventory {
    fn list_installed(&self) -> anyhow::Result<Vec<String>>;
}

/// One host command whose stdout lists one program per line
#[derive(Debug, Clone)]
pub struct QueryCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Removed from the end of each listed name, e.g. `.app` for macOS bundles
    pub strip_suffix: Option<String>,
}

impl QueryCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            strip_suffix: None,
        }
    }

    pub fn with_strip_suffix(mut self, suffix: &str) -> Self {
        self.strip_suffix = Some(suffix.to_string());
        self
    }

    fn run(&self) -> anyhow::Result<Vec<String>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("failed to run {}", self.program))?;

        if !output.status.success() {
            bail!("{} exited with {}", self.program, output.status);
        }

        let suffix = self.strip_suffix.as_deref().unwrap_or("");
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| {
                let line = line.trim();
                line.strip_suffix(suffix).unwrap_or(line).to_string()
            })
            .collect())
    }
}

/// Runs host query commands in order and returns the first successful listing
#[derive(Debug, Clone)]
pub struct CommandInventory {
    commands: Vec<QueryCommand>,
}

impl CommandInventory {
    pub fn new(commands: Vec<QueryCommand>) -> Self {
        Self { commands }
    }

    pub fn for_host() -> Self {
        #[cfg(target_os = "windows")]
        let commands = vec![QueryCommand::new(
            "powershell",
            &[
                "-NoProfile",
                "-Command",
                "Get-ItemProperty HKLM:\\Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\*, \
                 HKLM:\\Software\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\*, \
                 HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\* \
                 | Where-Object DisplayName | ForEach-Object { $_.DisplayName }",
            ],
        )];

        #[cfg(target_os = "macos")]
        let commands =
            vec![QueryCommand::new("ls", &["/Applications"]).with_strip_suffix(".app")];

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let commands = vec![
            QueryCommand::new("dpkg-query", &["-W", "-f=${Package}\\n"]),
            QueryCommand::new("rpm", &["-qa", "--qf", "%{NAME}\\n"]),
        ];

        Self::new(commands)
    }
}

impl SoftwareInventory for CommandInventory {
    fn list_installed(&self) -> anyhow::Result<Vec<String>> {
        let mut last_error = None;

        for command in &self.commands {
            match command.run() {
                Ok(names) => return Ok(names),
                Err(e) => {
                    debug!(program = %command.program, error = %e, "inventory query failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e.context("no software inventory command succeeded")),
            None => bail!("no software inventory command configured"),
        }
    }
}

/// Trim, drop blanks and case-insensitive duplicates, then sort case-insensitively
pub fn normalize_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cleaned: Vec<String> = names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect();

    cleaned.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    cleaned
}

/// Write the sorted program list to `destination/file_name`
pub fn write_report(
    inventory: &dyn SoftwareInventory,
    destination: &Path,
    file_name: &str,
) -> anyhow::Result<PathBuf> {
    let names = normalize_names(inventory.list_installed()?);

    let mut content = format!(
        "Installed programs (generated {})\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    for name in &names {
        content.push_str(name);
        content.push('\n');
    }

    let path = destination.join(file_name);
    fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), programs = names.len(), "wrote software report");
    Ok(path)
}
