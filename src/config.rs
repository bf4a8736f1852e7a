use crate::core::Budgets;
use crate::error::Result;
use crate::utils::paths::{canonical_root, is_within};
use crate::utils::validation::ValidationResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default settle window for coalescing change notifications in continuous mode.
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    // Trees
    pub active_dir: PathBuf,
    pub offload_dir: PathBuf,

    // Selection
    pub budgets: Budgets,

    // Behavior Settings
    pub continuous: bool,
    pub dry_run: bool,
    pub debounce_ms: u64,

    // Advanced Settings
    pub log_level: String,
}

impl Config {
    pub fn new(active_dir: impl Into<PathBuf>, offload_dir: impl Into<PathBuf>) -> Self {
        Self {
            active_dir: active_dir.into(),
            offload_dir: offload_dir.into(),
            budgets: Budgets::default(),
            continuous: false,
            dry_run: false,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            log_level: "info".to_string(),
        }
    }

    pub fn with_budgets(mut self, budgets: Budgets) -> Self {
        self.budgets = budgets;
        self
    }

    /// Applies environment overrides, validates, and replaces both roots by
    /// their canonical paths.
    pub fn load(mut self) -> Result<Self> {
        self.apply_env_overrides();
        self.validate()?;

        self.active_dir = canonical_root(&self.active_dir, "active")?;
        self.offload_dir = canonical_root(&self.offload_dir, "offload")?;

        tracing::debug!("Effective configuration: {}", self.export());
        Ok(self)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(debounce) = std::env::var("MEDIAQUEUE_DEBOUNCE_MS") {
            match debounce.parse::<u64>() {
                Ok(value) => self.debounce_ms = value,
                Err(e) => {
                    tracing::warn!(
                        "Invalid MEDIAQUEUE_DEBOUNCE_MS value '{}': {}. Using default.",
                        debounce,
                        e
                    );
                }
            }
        }
    }

    /// Validate configuration, reporting every problem at once
    pub fn validate(&self) -> Result<()> {
        let mut result = ValidationResult::new();

        result.merge(self.validate_roots());
        result.merge(self.validate_budgets());

        result.into_result()
    }

    fn validate_roots(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        let active = canonical_root(&self.active_dir, "active");
        let offload = canonical_root(&self.offload_dir, "offload");

        match (active, offload) {
            (Ok(active), Ok(offload)) => {
                if is_within(&active, &offload) || is_within(&offload, &active) {
                    result.add_error(
                        "The active dir and offload dir may not contain each other or be the same directory."
                            .to_string(),
                    );
                }
            }
            (active, offload) => {
                for err in [active.err(), offload.err()].into_iter().flatten() {
                    result.add_error(err.user_message());
                }
            }
        }

        result
    }

    fn validate_budgets(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        let budgets = &self.budgets;

        if let Some(limit) = budgets.global_limit {
            if budgets.global_minimum > limit {
                result.add_warning(format!(
                    "Global minimum {} exceeds global limit {}; the minimum takes precedence",
                    budgets.global_minimum, limit
                ));
            }
        }

        if budgets.per_directory_limit == Some(0) && budgets.global_minimum == 0 {
            result.add_warning(
                "Per-directory limit and global minimum are both 0; every file will be offloaded"
                    .to_string(),
            );
        }

        result
    }

    /// Export configuration
    pub fn export(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Get log filter based on log level
    pub fn get_log_filter(&self) -> String {
        match self.log_level.as_str() {
            "error" => "mediaqueue=error",
            "warn" => "mediaqueue=warn",
            "info" => "mediaqueue=info",
            "debug" => "mediaqueue=debug",
            "trace" => "mediaqueue=trace",
            _ => "mediaqueue=info",
        }
        .to_string()
    }
}
