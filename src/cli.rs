/// Command line surface and the pass driver behind it
use crate::config::Config;
use crate::core::{plan_pass, run_pass, Budgets, PassReport};
use crate::error::{AppError, Result};
use crate::services::{ChangeNotifier, FileWatcher};
use crate::utils::size::parse_size;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "mediaqueue")]
#[command(
    version,
    long_version = concat!(env!("MEDIAQUEUE_VERSION"), " (", env!("TARGET_TRIPLE"), ")"),
    about = "Keep a budgeted working set of files in an active directory and park the rest in an offload directory"
)]
pub struct Cli {
    /// Maximum number of files to put into the active dir per top-level
    /// directory. By default no limit applies, unless neither --global-limit
    /// nor --size-limit is set, in which case it defaults to 3.
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub per_directory_limit: Option<i64>,

    /// Maximum number of files to put into the active dir. By default no
    /// limit applies.
    #[arg(short = 'N', long, allow_negative_numbers = true)]
    pub global_limit: Option<i64>,

    /// Minimum number of files to put into the active dir.
    #[arg(short = 'm', long, default_value_t = 1, allow_negative_numbers = true)]
    pub global_minimum: i64,

    /// Maximum combined size of the files in the active dir, in bytes. The
    /// suffixes k, m ... y select powers of 1000, K, M ... Y powers of 1024.
    #[arg(short = 's', long, value_parser = size_value)]
    pub size_limit: Option<u64>,

    /// Keep running and reconcile again whenever either directory changes.
    #[arg(short = 'c', long)]
    pub continuous: bool,

    /// Print the planned placement of every file as JSON and change nothing.
    #[arg(long, conflicts_with = "continuous")]
    pub dry_run: bool,

    /// Log debug details.
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// The directory into which the active files should be put.
    pub active_dir: PathBuf,

    /// The directory into which the offloaded files should be put.
    pub offload_dir: PathBuf,
}

fn size_value(arg: &str) -> std::result::Result<u64, String> {
    parse_size(arg).map_err(|e| e.user_message())
}

impl Cli {
    /// Builds the configuration these arguments describe, unvalidated.
    pub fn into_config(self) -> Config {
        let budgets = Budgets::from_limits(
            self.per_directory_limit,
            self.global_limit,
            self.global_minimum,
            self.size_limit,
        );

        let mut config = Config::new(self.active_dir, self.offload_dir).with_budgets(budgets);
        config.continuous = self.continuous;
        config.dry_run = self.dry_run;
        config.log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
        .to_string();

        config
    }
}

pub struct CliApp {
    config: Config,
}

impl CliApp {
    /// Validates `config` and prepares it for execution
    pub fn new(config: Config) -> Result<Self> {
        let config = config.load()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs until done, or until the operator interrupts
    pub async fn execute(&self) -> Result<()> {
        tokio::select! {
            result = self.run() => result,
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => Err(AppError::Cancelled),
                Err(e) => Err(e.into()),
            },
        }
    }

    async fn run(&self) -> Result<()> {
        if self.config.dry_run {
            return self.print_plan().await;
        }

        if self.config.continuous {
            let mut watcher = FileWatcher::start(
                &[self.config.active_dir.as_path(), self.config.offload_dir.as_path()],
                Duration::from_millis(self.config.debounce_ms),
            )?;
            run_continuous(&self.config, &mut watcher).await
        } else {
            run_single_pass(&self.config).await.map(|_| ())
        }
    }

    async fn print_plan(&self) -> Result<()> {
        let config = self.config.clone();
        let plan = tokio::task::spawn_blocking(move || {
            plan_pass(&config.active_dir, &config.offload_dir, &config.budgets)
        })
        .await
        .map_err(|e| AppError::TaskFailed {
            message: e.to_string(),
        })??;

        println!("{}", serde_json::to_string_pretty(&plan)?);
        Ok(())
    }
}

/// Runs one pass on a blocking thread.
pub async fn run_single_pass(config: &Config) -> Result<PassReport> {
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        run_pass(&config.active_dir, &config.offload_dir, &config.budgets)
    })
    .await
    .map_err(|e| AppError::TaskFailed {
        message: e.to_string(),
    })?
}

/// Reconciles, then waits for the next change, forever. Returns only on
/// error, including errors reported by `notifier`.
pub async fn run_continuous<N>(config: &Config, notifier: &mut N) -> Result<()>
where
    N: ChangeNotifier + ?Sized,
{
    info!(
        "Starting continuous mode for {} and {}",
        config.active_dir.display(),
        config.offload_dir.display()
    );

    let mut passes = 0u64;
    loop {
        let report = run_single_pass(config).await?;
        passes += 1;
        debug!(
            "Pass {} finished with {} actions",
            passes,
            report.actions.total_actions()
        );

        notifier.wait_for_change().await?;
    }
}
