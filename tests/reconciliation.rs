//! Full passes over real directory trees.

use mediaqueue::core::{collect_inventory, run_pass, Budgets};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Trees {
    active: TempDir,
    offload: TempDir,
}

impl Trees {
    fn new() -> Self {
        Self {
            active: tempfile::tempdir().expect("Failed to create active dir"),
            offload: tempfile::tempdir().expect("Failed to create offload dir"),
        }
    }

    fn active(&self) -> &Path {
        self.active.path()
    }

    fn offload(&self) -> &Path {
        self.offload.path()
    }

    fn pass(&self, budgets: &Budgets) -> mediaqueue::core::PassReport {
        run_pass(self.active(), self.offload(), budgets).expect("pass failed")
    }

    fn files_under(root: &Path) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path.strip_prefix(root).unwrap();
                    let parts: Vec<_> = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    out.insert(parts.join("/"));
                }
            }
        }
        out
    }

    fn active_files(&self) -> BTreeSet<String> {
        Self::files_under(self.active())
    }

    fn offload_files(&self) -> BTreeSet<String> {
        Self::files_under(self.offload())
    }
}

fn write(path: PathBuf, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![b'x'; len]).unwrap();
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn five_offloaded() -> Trees {
    let trees = Trees::new();
    for i in 1..=5 {
        write(trees.offload().join(format!("A/a{}", i)), 100);
    }
    trees
}

#[test]
fn per_directory_limit_admits_lowest_ranked_files() {
    let trees = five_offloaded();

    let report = trees.pass(&Budgets::from_limits(Some(3), None, 1, None));

    assert_eq!(trees.active_files(), set(&["A/a1", "A/a2", "A/a3"]));
    assert_eq!(trees.offload_files(), set(&["A/a4", "A/a5"]));
    assert_eq!(report.actions.activated, 3);
    assert_eq!(report.active_bytes, 300);
}

#[test]
fn size_limit_stops_admission_and_caps_group() {
    let trees = five_offloaded();

    trees.pass(&Budgets::from_limits(Some(3), None, 1, Some(250)));

    assert_eq!(trees.active_files(), set(&["A/a1", "A/a2"]));
    assert_eq!(trees.offload_files(), set(&["A/a3", "A/a4", "A/a5"]));
}

#[test]
fn minimum_admits_file_larger_than_size_limit() {
    let trees = Trees::new();
    write(trees.offload().join("A/huge.bin"), 1000);

    trees.pass(&Budgets::from_limits(None, None, 1, Some(0)));

    assert_eq!(trees.active_files(), set(&["A/huge.bin"]));
    assert!(trees.offload_files().is_empty());
}

#[test]
fn stale_offload_duplicate_is_removed_when_active() {
    let trees = Trees::new();
    fs::create_dir_all(trees.active().join("A")).unwrap();
    fs::write(trees.active().join("A/a1"), b"keep me").unwrap();
    write(trees.offload().join("A/a1"), 3);

    let report = trees.pass(&Budgets::from_limits(Some(3), None, 1, None));

    assert_eq!(fs::read(trees.active().join("A/a1")).unwrap(), b"keep me");
    assert!(trees.offload_files().is_empty());
    assert_eq!(report.actions.duplicates_removed, 1);
}

#[test]
fn excess_active_file_is_offloaded_with_parents() {
    let trees = Trees::new();
    write(trees.active().join("A/a1"), 1);
    write(trees.active().join("A/season 2/a2"), 1);

    trees.pass(&Budgets::from_limits(Some(1), None, 1, None));

    assert_eq!(trees.active_files(), set(&["A/a1"]));
    assert_eq!(trees.offload_files(), set(&["A/season 2/a2"]));
}

#[test]
fn second_pass_is_a_no_op() {
    let trees = five_offloaded();
    write(trees.active().join("B/b1"), 10);
    write(trees.active().join("B/b2"), 10);
    write(trees.active().join("B/b3"), 10);
    write(trees.active().join("B/b4"), 10);

    let budgets = Budgets::from_limits(Some(2), Some(3), 1, None);
    let first = trees.pass(&budgets);
    assert!(first.actions.total_actions() > 0);

    let active = trees.active_files();
    let offload = trees.offload_files();

    let second = trees.pass(&budgets);
    assert_eq!(second.actions.total_actions(), 0);
    assert_eq!(trees.active_files(), active);
    assert_eq!(trees.offload_files(), offload);
}

#[test]
fn no_path_exists_in_both_trees_after_a_pass() {
    let trees = Trees::new();
    for i in 1..=4 {
        write(trees.active().join(format!("A/{}", i)), 1);
        write(trees.offload().join(format!("A/{}", i)), 1);
    }
    write(trees.offload().join("B/x"), 1);

    trees.pass(&Budgets::from_limits(Some(2), None, 1, None));

    let active = trees.active_files();
    let offload = trees.offload_files();
    assert!(active.is_disjoint(&offload));
    assert_eq!(active.len() + offload.len(), 5);
    assert_eq!(active, set(&["A/1", "A/2", "B/x"]));
}

#[test]
fn activating_last_file_prunes_empty_offload_directories() {
    let trees = Trees::new();
    write(trees.offload().join("A/deep/nested/a1"), 1);
    fs::write(trees.offload().join("A/deep/nested/.DS_Store"), b"").unwrap();

    let report = trees.pass(&Budgets::from_limits(Some(1), None, 1, None));

    assert_eq!(trees.active_files(), set(&["A/deep/nested/a1"]));
    assert!(!trees.offload().join("A").exists());
    assert!(trees.offload().exists());
    assert_eq!(report.actions.directories_pruned, 3);
}

#[test]
fn consumed_files_are_replaced_on_next_pass() {
    let trees = five_offloaded();
    let budgets = Budgets::from_limits(Some(2), None, 1, None);

    trees.pass(&budgets);
    assert_eq!(trees.active_files(), set(&["A/a1", "A/a2"]));

    fs::remove_file(trees.active().join("A/a1")).unwrap();
    trees.pass(&budgets);

    assert_eq!(trees.active_files(), set(&["A/a2", "A/a3"]));
    assert_eq!(trees.offload_files(), set(&["A/a4", "A/a5"]));
}

#[test]
fn interrupted_run_is_completed_by_the_next_pass() {
    let trees = Trees::new();
    // a2 was copied into the active tree but never removed from offload;
    // a3 was mid-offload when the previous run stopped.
    write(trees.active().join("A/a1"), 1);
    write(trees.active().join("A/a2"), 1);
    write(trees.offload().join("A/a2"), 1);
    write(trees.active().join("A/a3"), 1);
    write(trees.offload().join("A/a3"), 1);

    let budgets = Budgets::from_limits(Some(2), None, 1, None);
    trees.pass(&budgets);

    assert_eq!(trees.active_files(), set(&["A/a1", "A/a2"]));
    assert_eq!(trees.offload_files(), set(&["A/a3"]));
    assert_eq!(trees.pass(&budgets).actions.total_actions(), 0);
}

#[test]
fn groups_share_the_global_limit_rank_by_rank() {
    let trees = Trees::new();
    for i in 1..=3 {
        write(trees.offload().join(format!("big/{}", i)), 1);
    }
    write(trees.offload().join("small/1"), 1);

    trees.pass(&Budgets::from_limits(None, Some(2), 1, None));

    assert_eq!(trees.active_files(), set(&["big/1", "small/1"]));
}

#[test]
fn hidden_files_are_never_moved() {
    let trees = Trees::new();
    write(trees.active().join("A/.cache"), 1);
    write(trees.active().join(".hidden-group/a1"), 1);
    write(trees.active().join("A/a1"), 1);
    write(trees.active().join("A/a2"), 1);

    trees.pass(&Budgets::from_limits(Some(1), None, 1, None));

    assert!(trees.active().join("A/.cache").exists());
    assert!(trees.active().join(".hidden-group/a1").exists());
    assert_eq!(trees.offload_files(), set(&["A/a2"]));
}

#[test]
fn inventory_reflects_reconciled_state() {
    let trees = five_offloaded();
    trees.pass(&Budgets::from_limits(Some(3), None, 1, None));

    let inventory = collect_inventory(trees.active(), trees.offload()).unwrap();
    assert_eq!(inventory.file_count(), 5);
    assert_eq!(inventory.total_bytes(), 500);
}
