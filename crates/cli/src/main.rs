//! Catalog Sync CLI - operator view over the sync state database

mod logging;
mod settings;

use anyhow::{Context, Result};
use catalog_sync_core::application::constants::{
    DEFAULT_MONITOR_LIMIT, JOB_DELETE_ALL_PRODUCTS, JOB_DELETE_PRODUCTS, JOB_SYNC_ALL_PRODUCTS,
    JOB_UPDATE_PRODUCTS,
};
use catalog_sync_core::application::{FailureThresholdTracker, JobMonitor, SyncStateTracker};
use catalog_sync_core::domain::{JobRun, JobState, ProductId, ProductRef, SyncState, SyncStatus};
use catalog_sync_core::port::{SystemTimeProvider, TimeProvider};
use catalog_sync_infra_sqlite::{
    create_pool, current_version, run_migrations, SqliteFailureRepository, SqliteJobRepository,
    SqlitePool, SqliteSyncStateRepository,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use settings::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::{debug, info};

const JOB_NAMES: [&str; 4] = [
    JOB_DELETE_ALL_PRODUCTS,
    JOB_SYNC_ALL_PRODUCTS,
    JOB_UPDATE_PRODUCTS,
    JOB_DELETE_PRODUCTS,
];

#[derive(Parser)]
#[command(name = "catalog-sync")]
#[command(about = "Catalog Sync Engine CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./catalog-sync.toml when present)
    #[arg(long, env = "CATALOG_SYNC_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show product counts per sync status and job run totals
    Status,

    /// List products whose last sync attempt was rejected
    Issues {
        #[arg(short, long, default_value_t = DEFAULT_MONITOR_LIMIT)]
        limit: usize,
    },

    /// List recent job runs
    Jobs {
        #[arg(short, long, default_value_t = DEFAULT_MONITOR_LIMIT)]
        limit: usize,
    },

    /// Show one job run in detail
    Job {
        /// Job run ID
        run_id: String,
    },

    /// Show the in-window failure count of one product
    Failures {
        /// Product ID
        product_id: ProductId,
    },

    /// Clear failure records and mark the product for a fresh sync
    Reset {
        /// Product ID
        product_id: ProductId,
    },

    /// Apply pending database migrations
    Migrate,
}

#[derive(Tabled)]
struct StatusRow {
    status: String,
    products: i64,
}

#[derive(Tabled)]
struct JobSummaryRow {
    job: String,
    scheduled: i64,
    running: i64,
    completed: i64,
    failed: i64,
}

#[derive(Tabled)]
struct IssueRow {
    product: ProductId,
    parent: String,
    remote_id: String,
    updated: String,
    error: String,
}

impl From<SyncState> for IssueRow {
    fn from(state: SyncState) -> Self {
        Self {
            product: state.product.id,
            parent: display_opt(state.product.parent_id),
            remote_id: display_opt(state.remote_id),
            updated: format_millis(Some(state.updated_at)),
            error: state.last_error.unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct JobRunRow {
    id: String,
    job: String,
    state: String,
    batch: u32,
    items: u64,
    created: String,
    finished: String,
    error: String,
}

impl From<JobRun> for JobRunRow {
    fn from(run: JobRun) -> Self {
        Self {
            id: run.id,
            job: run.name,
            state: run.state.to_string(),
            batch: run.batch_number,
            items: run.items_processed,
            created: format_millis(Some(run.created_at)),
            finished: format_millis(run.finished_at),
            error: run.error.unwrap_or_default(),
        }
    }
}

fn display_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_millis(millis: Option<i64>) -> String {
    millis
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

async fn open_database(config: &AppConfig) -> Result<SqlitePool> {
    if let Some(dir) = config.database_dir() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }

    let url = config.resolved_database_url();
    debug!(database_url = %url, "Opening database");
    let pool = create_pool(&url)
        .await
        .context("Failed to open database")?;
    let version = run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    debug!(schema_version = version, "Schema ready");
    Ok(pool)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init(&config.log_format)?;
    debug!(version = catalog_sync_core::VERSION, "catalog-sync starting");

    let pool = open_database(&config).await?;
    let time: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let states = SyncStateTracker::new(
        Arc::new(SqliteSyncStateRepository::new(pool.clone())),
        time.clone(),
    );
    let failures = FailureThresholdTracker::from_config(
        Arc::new(SqliteFailureRepository::new(pool.clone())),
        time.clone(),
        &config.sync,
    );
    let monitor = JobMonitor::new(Arc::new(SqliteJobRepository::new(pool.clone())));

    match cli.command {
        Commands::Status => {
            println!("{}", "Sync Status".cyan().bold());
            println!();

            let mut rows = Vec::with_capacity(SyncStatus::ALL.len());
            for status in SyncStatus::ALL {
                rows.push(StatusRow {
                    status: status.to_string(),
                    products: states.count_by_status(status).await?,
                });
            }
            println!("{}", Table::new(rows));
            println!();

            println!("{}", "Jobs".cyan().bold());
            println!();
            let summaries = monitor.summary(&JOB_NAMES).await?;
            let active: i64 = summaries.iter().map(|s| s.active()).sum();
            let rows: Vec<JobSummaryRow> = summaries
                .into_iter()
                .map(|s| JobSummaryRow {
                    job: s.name,
                    scheduled: s.scheduled,
                    running: s.running,
                    completed: s.completed,
                    failed: s.failed,
                })
                .collect();
            println!("{}", Table::new(rows));
            println!();

            if active > 0 {
                println!("  {} {}", "Active runs:".bold(), active.to_string().yellow());
            } else {
                println!("  {} {}", "Active runs:".bold(), "none".green());
            }
        }

        Commands::Issues { limit } => {
            let issues = states.find_by_status(SyncStatus::Invalid, limit).await?;
            if issues.is_empty() {
                println!("{}", "✓ No sync issues".green().bold());
            } else {
                println!(
                    "{}",
                    format!("{} product(s) with sync issues", issues.len())
                        .yellow()
                        .bold()
                );
                println!();
                let rows: Vec<IssueRow> = issues.into_iter().map(IssueRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Jobs { limit } => {
            let runs = monitor.recent(limit).await?;
            if runs.is_empty() {
                println!("{}", "No job runs recorded".yellow());
            } else {
                let rows: Vec<JobRunRow> = runs.into_iter().map(JobRunRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Job { run_id } => {
            let run = monitor
                .find(&run_id)
                .await?
                .with_context(|| format!("No job run {}", run_id))?;

            let state = match run.state {
                JobState::Completed => run.state.to_string().green(),
                JobState::Failed => run.state.to_string().red(),
                _ => run.state.to_string().yellow(),
            };
            println!("{}", format!("Job run {}", run.id).cyan().bold());
            println!();
            println!("  {} {}", "Job:".bold(), run.name);
            println!("  {} {}", "State:".bold(), state);
            println!("  {} {}", "Batch:".bold(), run.batch_number);
            println!("  {} {}", "Items:".bold(), run.items_processed);
            println!("  {} {}", "Created:".bold(), format_millis(Some(run.created_at)));
            println!("  {} {}", "Started:".bold(), format_millis(run.started_at));
            println!("  {} {}", "Finished:".bold(), format_millis(run.finished_at));
            println!("  {} {}", "Payload:".bold(), run.payload.as_value());
            if let Some(error) = &run.error {
                println!("  {} {}", "Error:".bold(), error.red());
            }
        }

        Commands::Failures { product_id } => {
            let product = states
                .state(product_id)
                .await?
                .map(|state| state.product)
                .unwrap_or_else(|| ProductRef::id_only(product_id));
            let window = failures.window(&product).await?;
            let suppressed = failures.is_suppressed(&product).await?;

            println!("{}", format!("Failures for product {}", product_id).cyan().bold());
            println!();
            println!(
                "  {} {} / {}",
                "In window:".bold(),
                window.attempts,
                failures.threshold()
            );
            println!(
                "  {} {}",
                "First failure:".bold(),
                format_millis(window.first_failure_at)
            );
            println!(
                "  {} {}",
                "Rolls over:".bold(),
                format_millis(window.rolls_over_at(config.sync.failure_window_ms()))
            );
            if suppressed {
                println!("  {} {}", "Retries:".bold(), "SUPPRESSED".red());
            } else {
                println!("  {} {}", "Retries:".bold(), "allowed".green());
            }
        }

        Commands::Reset { product_id } => {
            let state = states
                .state(product_id)
                .await?
                .with_context(|| format!("No sync state for product {}", product_id))?;

            let cleared = failures.reset(&state.product).await?;
            states.mark_as_unsynced(&state.product).await?;
            info!(product_id = product_id, cleared = cleared, "Product reset for resync");

            println!(
                "{}",
                format!("✓ Product {} reset for resync", product_id)
                    .green()
                    .bold()
            );
            println!("  {} {} failure record(s) cleared", "✓".green(), cleared);
            if state.remote_id.is_some() {
                println!(
                    "  {} remote copy is overwritten on the next sync",
                    "•".bold()
                );
            }
        }

        Commands::Migrate => {
            let version = current_version(&pool).await?;
            println!("{}", "✓ Database schema up to date".green().bold());
            println!("  {} {}", "Schema version:".bold(), version);
            println!("  {} {}", "Database:".bold(), config.resolved_database_url());
        }
    }

    Ok(())
}
