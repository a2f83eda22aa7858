use crate::error::DrivebakError;
use crate::utils::format_gib;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Capacity of the volume hosting a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeUsage {
    pub total_bytes: u64,
    /// Space available to the current user
    pub free_bytes: u64,
}

/// Source of live volume statistics
pub trait VolumeProbe {
    fn usage(&self, path: &Path) -> std::io::Result<VolumeUsage>;
}

/// Queries the host filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct HostVolumes;

impl VolumeProbe for HostVolumes {
    fn usage(&self, path: &Path) -> std::io::Result<VolumeUsage> {
        Ok(VolumeUsage {
            total_bytes: fs2::total_space(path)?,
            free_bytes: fs2::available_space(path)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sufficient { surplus: u64 },
    Insufficient { shortfall: u64 },
}

#[derive(Debug, Clone)]
pub struct SpaceReport {
    pub destination: PathBuf,
    pub required_bytes: u64,
    pub usage: VolumeUsage,
    pub verdict: Verdict,
}

impl SpaceReport {
    pub fn is_sufficient(&self) -> bool {
        matches!(self.verdict, Verdict::Sufficient { .. })
    }

    /// One-line decision, sizes in GiB
    pub fn verdict_line(&self) -> String {
        match self.verdict {
            Verdict::Sufficient { surplus } => format!(
                "Sufficient space: {} will remain free after the backup.",
                format_gib(surplus)
            ),
            Verdict::Insufficient { shortfall } => format!(
                "Not enough space. You are short by {}.",
                format_gib(shortfall)
            ),
        }
    }
}

/// Compare `required_bytes` against the free space of the volume holding `destination`.
///
/// The destination must already exist; usage of a missing path cannot be queried.
pub fn audit_space(
    probe: &dyn VolumeProbe,
    destination: &Path,
    required_bytes: u64,
) -> Result<SpaceReport> {
    if !destination.is_dir() {
        return Err(DrivebakError::DestinationNotDirectory {
            path: destination.to_path_buf(),
        });
    }

    let usage = probe
        .usage(destination)
        .map_err(|source| DrivebakError::VolumeQuery {
            path: destination.to_path_buf(),
            source,
        })?;

    let verdict = decide(required_bytes, usage.free_bytes);
    debug!(
        required_bytes,
        free_bytes = usage.free_bytes,
        total_bytes = usage.total_bytes,
        ?verdict,
        "space audit"
    );

    Ok(SpaceReport {
        destination: destination.to_path_buf(),
        required_bytes,
        usage,
        verdict,
    })
}

fn decide(required_bytes: u64, free_bytes: u64) -> Verdict {
    if free_bytes >= required_bytes {
        Verdict::Sufficient {
            surplus: free_bytes - required_bytes,
        }
    } else {
        Verdict::Insufficient {
            shortfall: required_bytes - free_bytes,
        }
    }
}
