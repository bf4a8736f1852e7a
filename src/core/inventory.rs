use crate::error::Result;
use crate::utils::paths::is_hidden_name;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Files of one group, keyed by their path relative to the group directory.
pub type GroupFiles = BTreeMap<PathBuf, u64>;

/// Snapshot of both trees taken at the start of a pass: group name ->
/// relative path -> size in bytes. Group names are kept as raw OS strings so
/// directories with names that are not valid UTF-8 are reconciled as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    groups: BTreeMap<OsString, GroupFiles>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a file. A later insert of the same path replaces the size.
    pub fn insert(&mut self, group: impl Into<OsString>, relative_path: impl Into<PathBuf>, size: u64) {
        self.groups
            .entry(group.into())
            .or_default()
            .insert(relative_path.into(), size);
    }

    pub fn groups(&self) -> impl Iterator<Item = (&OsStr, &GroupFiles)> {
        self.groups.iter().map(|(name, files)| (name.as_os_str(), files))
    }

    pub fn group(&self, name: impl AsRef<OsStr>) -> Option<&GroupFiles> {
        self.groups.get(name.as_ref())
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn file_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.groups
            .values()
            .flat_map(BTreeMap::values)
            .fold(0u64, |acc, size| acc.saturating_add(*size))
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }
}

/// Scans both trees and merges what it finds into one inventory.
///
/// Groups are the non-hidden immediate subdirectories of either root. Within
/// a group every non-hidden regular file is recorded; hidden directories are
/// not descended into. When a path exists in both trees the offload copy's
/// size wins, the reconciler resolves the duplicate later.
pub fn collect_inventory(active_dir: &Path, offload_dir: &Path) -> Result<Inventory> {
    let mut inventory = Inventory::new();

    for root in [active_dir, offload_dir] {
        for group in child_groups(root)? {
            let group_root = root.join(&group);
            collect_group_files(&group_root, |relative_path, size| {
                inventory.insert(group.clone(), relative_path, size);
            })?;
        }
    }

    debug!(
        "Collected {} files ({} bytes) in {} groups",
        inventory.file_count(),
        inventory.total_bytes(),
        inventory.group_count()
    );

    Ok(inventory)
}

/// Names of the non-hidden directories directly below `root`.
fn child_groups(root: &Path) -> Result<Vec<OsString>> {
    let mut groups = Vec::new();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();

        if is_hidden_name(&name) || !entry.path().is_dir() {
            continue;
        }

        groups.push(name);
    }

    Ok(groups)
}

fn collect_group_files(group_root: &Path, mut visit: impl FnMut(PathBuf, u64)) -> Result<()> {
    let walker = WalkDir::new(group_root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_hidden_name(entry.file_name()));

    for entry in walker {
        let entry = entry?;

        if entry.file_type().is_dir() {
            continue;
        }

        // Symlinks count as files when their target is one.
        let metadata = match std::fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(e) if entry.path_is_symlink() && e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Skipping dangling symlink: {}", entry.path().display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            continue;
        }

        let Ok(relative_path) = entry.path().strip_prefix(group_root) else {
            continue;
        };

        visit(relative_path.to_path_buf(), metadata.len());
    }

    Ok(())
}
