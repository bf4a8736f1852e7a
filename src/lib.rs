//! Keeps a budgeted working set of files in an active tree and parks the
//! rest in an offload tree, preserving relative paths.
//!
//! Each top-level directory of either tree is a group. Every pass scans both
//! trees ([`crate::core::collect_inventory`]), decides which files belong in the
//! active tree ([`crate::core::select_files`]), and moves files until the trees
//! match those decisions ([`crate::core::reconcile`]). Nothing is persisted between
//! passes, so an interrupted pass is completed by simply running again.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod utils;

use tracing::debug;
use tracing_subscriber::EnvFilter;

pub use crate::cli::{Cli, CliApp};
pub use crate::config::Config;
pub use crate::error::{AppError, Result};

/// Installs the stderr log subscriber. `MEDIAQUEUE_LOG` takes precedence
/// over `RUST_LOG`, which takes precedence over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_new(filter_directives(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn filter_directives(default_filter: &str) -> String {
    std::env::var("MEDIAQUEUE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_filter.to_string())
}

/// Runs the tool for already parsed arguments. A `.env` file in the working
/// directory is loaded before logging is set up, so it may set the filter.
pub async fn run(cli: Cli) -> Result<()> {
    dotenv::dotenv().ok();

    let config = cli.into_config();
    init_tracing(&config.get_log_filter());

    let result = match CliApp::new(config) {
        Ok(app) => app.execute().await,
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        debug!(
            "{} (recoverable: {}): {}",
            e.error_type(),
            e.is_recoverable(),
            e.source_chain().join(": ")
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotenv_log_filter_takes_precedence_over_rust_log() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(
            &env_file,
            "MEDIAQUEUE_LOG=mediaqueue=trace\nRUST_LOG=mediaqueue=error\n",
        )
        .unwrap();

        dotenv::from_path(&env_file).unwrap();

        assert_eq!(filter_directives("mediaqueue=info"), "mediaqueue=trace");
    }
}
