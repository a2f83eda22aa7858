use std::path::{Component, Path, PathBuf};

/// Maps source files onto the destination tree.
///
/// Every source root is placed under the destination by its path relative to the common
/// ancestor of the roots' parent directories. Each root therefore keeps at least its own
/// directory name as a first segment, and two distinct roots never share a subtree:
/// `/home/u/Pictures` and `/home/u/Documents` become `Pictures/` and `Documents/`, while
/// `/home/u/Pictures` and `/home/u/OneDrive/Pictures` become `Pictures/` and
/// `OneDrive/Pictures/`.
#[derive(Debug, Clone)]
pub struct DestinationLayout {
    destination: PathBuf,
    ancestor: PathBuf,
    prefixes: Vec<PathBuf>,
}

impl DestinationLayout {
    pub fn new(destination: impl Into<PathBuf>, roots: &[PathBuf]) -> Self {
        let parents: Vec<&Path> = roots
            .iter()
            .map(|root| root.parent().unwrap_or(root.as_path()))
            .collect();
        let ancestor = common_ancestor(&parents);

        let prefixes = roots
            .iter()
            .map(|root| root_prefix(root, &ancestor))
            .collect();

        Self {
            destination: destination.into(),
            ancestor,
            prefixes,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Directory every root is placed relative to
    pub fn ancestor(&self) -> &Path {
        &self.ancestor
    }

    /// Destination directory that mirrors root `root_index`
    pub fn root_dir(&self, root_index: usize) -> PathBuf {
        match self.prefixes.get(root_index) {
            Some(prefix) => self.destination.join(prefix),
            None => self.destination.clone(),
        }
    }

    /// Destination directory for a source directory found under root `root_index`
    pub fn target_dir(&self, root: &Path, root_index: usize, containing_dir: &Path) -> PathBuf {
        let base = self.root_dir(root_index);
        match containing_dir.strip_prefix(root) {
            Ok(relative) => base.join(relative),
            Err(_) => base,
        }
    }
}

/// Longest shared leading path of `paths`; empty when they share nothing
fn common_ancestor(paths: &[&Path]) -> PathBuf {
    let Some((first, rest)) = paths.split_first() else {
        return PathBuf::new();
    };

    let mut shared: Vec<Component> = first.components().collect();
    for path in rest {
        let matching = shared
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        shared.truncate(matching);
    }

    shared.iter().collect()
}

/// Path of `root` below `ancestor`, without root or prefix components.
/// Falls back to the root's own name so a root never maps onto the destination itself.
fn root_prefix(root: &Path, ancestor: &Path) -> PathBuf {
    let relative: PathBuf = root
        .strip_prefix(ancestor)
        .unwrap_or(root)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();

    if relative.as_os_str().is_empty() {
        root.file_name().map(PathBuf::from).unwrap_or_default()
    } else {
        relative
    }
}
