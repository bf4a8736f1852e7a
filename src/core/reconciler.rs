//! Converges both trees to a set of decisions.
//!
//! Nothing from the inventory snapshot is trusted here: every move or removal
//! is preceded by a fresh existence check, so a pass may be interrupted at any
//! point and rerun.

use super::selector::Decision;
use crate::error::Result;
use crate::utils::paths::{display_relative, is_hidden_name};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix of the hidden staging file used when a move has to copy.
const PARTIAL_SUFFIX: &str = ".mediaqueue-partial";

/// Actions performed by one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub activated: usize,
    pub offloaded: usize,
    pub duplicates_removed: usize,
    pub directories_pruned: usize,
}

impl ReconcileStats {
    pub fn total_actions(&self) -> usize {
        self.activated + self.offloaded + self.duplicates_removed + self.directories_pruned
    }
}

pub struct Reconciler<'a> {
    active_dir: &'a Path,
    offload_dir: &'a Path,
    stats: ReconcileStats,
}

impl<'a> Reconciler<'a> {
    pub fn new(active_dir: &'a Path, offload_dir: &'a Path) -> Self {
        Self {
            active_dir,
            offload_dir,
            stats: ReconcileStats::default(),
        }
    }

    /// Applies every decision in order and returns what was done.
    pub fn apply(mut self, decisions: &[Decision]) -> Result<ReconcileStats> {
        for decision in decisions {
            self.apply_one(decision)?;
        }

        debug!(
            "Reconciled {} files: {} activated, {} offloaded, {} duplicates removed, {} directories pruned",
            decisions.len(),
            self.stats.activated,
            self.stats.offloaded,
            self.stats.duplicates_removed,
            self.stats.directories_pruned
        );

        Ok(self.stats)
    }

    fn apply_one(&mut self, decision: &Decision) -> Result<()> {
        let active_path = self.active_dir.join(&decision.group).join(&decision.relative_path);
        let offload_path = self.offload_dir.join(&decision.group).join(&decision.relative_path);
        let label = display_relative(&decision.group, &decision.relative_path);

        if decision.activate {
            if !exists(&offload_path)? {
                return Ok(());
            }

            if exists(&active_path)? {
                self.remove_duplicate(&offload_path, &label)?;
                self.prune_empty_parents(&offload_path)?;
            } else {
                info!("Activating: {}", label);
                move_file(&offload_path, &active_path)?;
                self.stats.activated += 1;
                self.prune_empty_parents(&offload_path)?;
            }
        } else {
            if !exists(&active_path)? {
                return Ok(());
            }

            if exists(&offload_path)? {
                self.remove_duplicate(&offload_path, &label)?;
            }

            info!("Offloading: {}", label);
            move_file(&active_path, &offload_path)?;
            self.stats.offloaded += 1;
        }

        Ok(())
    }

    fn remove_duplicate(&mut self, path: &Path, label: &str) -> Result<()> {
        info!("Removing: {}", label);
        remove_path(path)?;
        self.stats.duplicates_removed += 1;
        Ok(())
    }

    /// Removes directories above `path` that hold nothing but hidden entries,
    /// walking upwards until the offload root, which is never removed.
    fn prune_empty_parents(&mut self, path: &Path) -> Result<()> {
        let mut current = path.parent();

        while let Some(dir) = current {
            if dir == self.offload_dir || !dir.starts_with(self.offload_dir) {
                break;
            }

            if !is_prunable(dir)? {
                break;
            }

            let relative = dir.strip_prefix(self.offload_dir).unwrap_or(dir);
            info!("Removing directory: {}", relative.display());
            fs::remove_dir_all(dir)?;
            self.stats.directories_pruned += 1;

            current = dir.parent();
        }

        Ok(())
    }
}

/// Applies `decisions` to the two trees.
pub fn reconcile(
    decisions: &[Decision],
    active_dir: &Path,
    offload_dir: &Path,
) -> Result<ReconcileStats> {
    Reconciler::new(active_dir, offload_dir).apply(decisions)
}

/// Like `Path::exists`, but errors other than "not found" are surfaced
/// instead of being read as absence. Links are followed, so a dangling
/// symlink is absent and never shadows the real copy in the other tree.
fn exists(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// A directory is prunable when every entry is hidden and none of them is a
/// non-empty directory. A directory that vanished is not.
fn is_prunable(dir: &Path) -> io::Result<bool> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let entry = entry?;

        if !is_hidden_name(&entry.file_name()) {
            return Ok(false);
        }

        if entry.file_type()?.is_dir() && fs::read_dir(entry.path())?.next().is_some() {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Moves `source` to `target`, creating missing parent directories. Falls
/// back to copy and delete when the trees live on different filesystems.
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(source, target),
        Err(e) => Err(e),
    }
}

fn copy_then_remove(source: &Path, target: &Path) -> io::Result<()> {
    let staging = staging_path(target);
    debug!(
        "Copying {} across filesystems via {}",
        source.display(),
        staging.display()
    );

    if let Err(e) = fs::copy(source, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    fs::rename(&staging, target)?;
    fs::remove_file(source)
}

/// Hidden sibling of `target`, ignored by scans if a copy is interrupted.
fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}{}", name, PARTIAL_SUFFIX))
}
