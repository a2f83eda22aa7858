use crate::error::DrivebakError;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of looking up one requested folder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Found directly under the base directory
    Primary(PathBuf),
    /// Found under the cloud-sync folder
    Fallback(PathBuf),
    NotFound { name: String },
}

impl Resolution {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Primary(path) | Resolution::Fallback(path) => Some(path),
            Resolution::NotFound { .. } => None,
        }
    }

    /// Human-readable found/skipped line shown for every requested folder
    pub fn status_line(&self) -> String {
        match self {
            Resolution::Primary(path) => format!("Found {}", path.display()),
            Resolution::Fallback(path) => format!("Found {} (cloud-sync folder)", path.display()),
            Resolution::NotFound { name } => format!("Folder \"{name}\" not found, skipping"),
        }
    }
}

/// Looks up folder names under a base directory, then under a cloud-sync subfolder
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
    fallback: Option<PathBuf>,
}

impl PathResolver {
    /// An empty `cloud_sync_folder` disables the fallback
    pub fn new(base: impl Into<PathBuf>, cloud_sync_folder: &str) -> Self {
        let base = base.into();
        let fallback = if cloud_sync_folder.trim().is_empty() {
            None
        } else {
            Some(base.join(cloud_sync_folder.trim()))
        };
        Self { base, fallback }
    }

    pub fn resolve(&self, name: &str) -> Resolution {
        let candidate = absolute(&self.base.join(name));
        if candidate.is_dir() {
            debug!(name, path = %candidate.display(), "resolved under base directory");
            return Resolution::Primary(candidate);
        }

        if let Some(fallback) = &self.fallback {
            let candidate = absolute(&fallback.join(name));
            if candidate.is_dir() {
                debug!(name, path = %candidate.display(), "resolved under cloud-sync folder");
                return Resolution::Fallback(candidate);
            }
        }

        debug!(name, "folder not found");
        Resolution::NotFound {
            name: name.to_string(),
        }
    }

    /// Resolve every name independently, keeping request order and duplicates
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Vec<Resolution> {
        names.iter().map(|name| self.resolve(name.as_ref())).collect()
    }
}

/// The source roots of a set of resolutions, in request order
pub fn source_roots(resolutions: &[Resolution]) -> Vec<PathBuf> {
    resolutions
        .iter()
        .filter_map(|r| r.path().map(Path::to_path_buf))
        .collect()
}

/// Base directory for folder lookup: the override, else `HOME`, else `USERPROFILE`
pub fn home_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }

    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .ok_or(DrivebakError::NoHomeDirectory)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
