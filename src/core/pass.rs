use super::inventory::collect_inventory;
use super::reconciler::{reconcile, ReconcileStats};
use super::selector::{select_files, Budgets, Decision};
use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Outcome of selecting files, before anything is moved.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub total_files: usize,
    pub active_files: usize,
    pub active_bytes: u64,
    pub decisions: Vec<Decision>,
}

impl Plan {
    fn from_decisions(decisions: Vec<Decision>) -> Self {
        let (active_files, active_bytes) = decisions
            .iter()
            .filter(|d| d.activate)
            .fold((0usize, 0u64), |(files, bytes), d| {
                (files + 1, bytes.saturating_add(d.size))
            });

        Self {
            total_files: decisions.len(),
            active_files,
            active_bytes,
            decisions,
        }
    }
}

/// Summary of one full pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub total_files: usize,
    pub active_files: usize,
    pub active_bytes: u64,
    pub actions: ReconcileStats,
}

/// Scans both trees and decides where every file belongs.
pub fn plan_pass(active_dir: &Path, offload_dir: &Path, budgets: &Budgets) -> Result<Plan> {
    let inventory = collect_inventory(active_dir, offload_dir)?;
    Ok(Plan::from_decisions(select_files(&inventory, budgets)))
}

/// One full scan, select and reconcile cycle.
pub fn run_pass(active_dir: &Path, offload_dir: &Path, budgets: &Budgets) -> Result<PassReport> {
    let plan = plan_pass(active_dir, offload_dir, budgets)?;
    let actions = reconcile(&plan.decisions, active_dir, offload_dir)?;

    let report = PassReport {
        total_files: plan.total_files,
        active_files: plan.active_files,
        active_bytes: plan.active_bytes,
        actions,
    };

    debug!(
        "Pass complete: {} of {} files active ({} bytes), {} actions",
        report.active_files,
        report.total_files,
        report.active_bytes,
        report.actions.total_actions()
    );

    Ok(report)
}
