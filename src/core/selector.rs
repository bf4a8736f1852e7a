//! Budgeted partitioning of the inventory into active and offloaded files.
//!
//! Files are visited rank by rank across all groups: every group's first file
//! is considered before any group's second file. The first rejection in a
//! group caps it, so the active files of a group are always a prefix of its
//! natural ordering.

use super::inventory::Inventory;
use super::natural_key::natural_key;
use crate::utils::paths::serialize_lossy;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Per-directory limit used when no count or size limit is given at all.
pub const DEFAULT_PER_DIRECTORY_LIMIT: u64 = 3;

/// Default for the guaranteed number of active files.
pub const DEFAULT_GLOBAL_MINIMUM: u64 = 1;

/// Limits on what may reside in the active tree. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budgets {
    pub per_directory_limit: Option<u64>,
    pub global_limit: Option<u64>,
    pub global_minimum: u64,
    pub size_limit: Option<u64>,
}

impl Default for Budgets {
    fn default() -> Self {
        Self::from_limits(None, None, DEFAULT_GLOBAL_MINIMUM as i64, None)
    }
}

impl Budgets {
    /// Resolves raw limits as given by the user. Negative counts behave
    /// like zero. If neither count limit nor the size limit is set, the
    /// per-directory limit falls back to [`DEFAULT_PER_DIRECTORY_LIMIT`].
    pub fn from_limits(
        per_directory_limit: Option<i64>,
        global_limit: Option<i64>,
        global_minimum: i64,
        size_limit: Option<u64>,
    ) -> Self {
        let clamp = |v: i64| v.max(0) as u64;

        let mut per_directory_limit = per_directory_limit.map(clamp);
        let global_limit = global_limit.map(clamp);

        if per_directory_limit.is_none() && global_limit.is_none() && size_limit.is_none() {
            per_directory_limit = Some(DEFAULT_PER_DIRECTORY_LIMIT);
        }

        Self {
            per_directory_limit,
            global_limit,
            global_minimum: clamp(global_minimum),
            size_limit,
        }
    }

    /// No limits at all and no minimum.
    pub fn unlimited() -> Self {
        Self {
            per_directory_limit: None,
            global_limit: None,
            global_minimum: 0,
            size_limit: None,
        }
    }
}

/// Whether one file should be active, in the order it was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub activate: bool,
    #[serde(serialize_with = "serialize_lossy")]
    pub group: OsString,
    #[serde(serialize_with = "serialize_lossy")]
    pub relative_path: PathBuf,
    pub size: u64,
    pub rank: usize,
}

/// Running totals of one selection pass.
#[derive(Debug, Default)]
struct Tally<'a> {
    files: u64,
    bytes: u64,
    files_by_group: HashMap<&'a OsStr, u64>,
    capped_groups: HashSet<&'a OsStr>,
}

impl<'a> Tally<'a> {
    fn admits(&self, budgets: &Budgets, group: &OsStr, size: u64) -> bool {
        if self.capped_groups.contains(group) {
            return false;
        }

        if self.files < budgets.global_minimum {
            return true;
        }

        let group_files = self.files_by_group.get(group).copied().unwrap_or(0);
        let within_group = budgets
            .per_directory_limit
            .map_or(true, |limit| group_files < limit);
        let within_global = budgets.global_limit.map_or(true, |limit| self.files < limit);
        let within_size = budgets
            .size_limit
            .map_or(true, |limit| limit.checked_sub(self.bytes).is_some_and(|room| size <= room));

        within_group && within_global && within_size
    }

    fn record(&mut self, group: &'a OsStr, size: u64, activate: bool) {
        if activate {
            *self.files_by_group.entry(group).or_insert(0) += 1;
            self.files += 1;
            self.bytes = self.bytes.saturating_add(size);
        } else {
            self.capped_groups.insert(group);
        }
    }
}

struct Candidate<'a> {
    rank: usize,
    group_size: usize,
    key: String,
    group: &'a OsStr,
    relative_path: &'a PathBuf,
    size: u64,
}

/// Decides for every file of `inventory` whether it belongs in the active
/// tree. Pure and deterministic; decisions come back in processing order.
pub fn select_files(inventory: &Inventory, budgets: &Budgets) -> Vec<Decision> {
    let mut candidates: Vec<Candidate<'_>> = Vec::with_capacity(inventory.file_count());

    for (group, files) in inventory.groups() {
        let mut ranked: Vec<(String, &PathBuf, u64)> = files
            .iter()
            .map(|(path, size)| (natural_key(&path.to_string_lossy()), path, *size))
            .collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        for (rank, (key, relative_path, size)) in ranked.into_iter().enumerate() {
            candidates.push(Candidate {
                rank,
                group_size: files.len(),
                key,
                group,
                relative_path,
                size,
            });
        }
    }

    candidates.sort_by(|a, b| {
        (a.rank, Reverse(a.group_size), &a.key, a.group).cmp(&(
            b.rank,
            Reverse(b.group_size),
            &b.key,
            b.group,
        ))
    });

    let mut tally = Tally::default();

    candidates
        .into_iter()
        .map(|candidate| {
            let activate = tally.admits(budgets, candidate.group, candidate.size);
            tally.record(candidate.group, candidate.size, activate);

            Decision {
                activate,
                group: candidate.group.to_os_string(),
                relative_path: candidate.relative_path.clone(),
                size: candidate.size,
                rank: candidate.rank,
            }
        })
        .collect()
}
