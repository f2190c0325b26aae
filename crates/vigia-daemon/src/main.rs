//! vigia daemon binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, loads the state catalog, and runs the reconciliation
//! scheduler until interrupted. With `--run-once` it performs a single
//! manual reconciliation, prints the summary as JSON, and exits.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigia_core::{audit::RunMode, store::DocumentStore as _};
use vigia_engine::{Reconciler, Scheduler};
use vigia_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vigia document lifecycle daemon")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run a single manual reconciliation, print the summary, and exit.
  #[arg(long)]
  run_once: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct DaemonConfig {
  /// Path to the SQLite database file.
  store_path: PathBuf,

  #[serde(default = "default_interval_hours")]
  reconcile_interval_hours: u64,

  #[serde(default = "default_startup_delay_secs")]
  startup_delay_secs: u64,
}

impl DaemonConfig {
  /// Scheduler period from the configured hours. Zero is rejected: the
  /// scheduler cannot tick on a zero-length interval.
  fn reconcile_period(&self) -> anyhow::Result<Duration> {
    anyhow::ensure!(
      self.reconcile_interval_hours >= 1,
      "reconcile_interval_hours must be at least 1, got {}",
      self.reconcile_interval_hours
    );
    Ok(Duration::from_secs(self.reconcile_interval_hours * 60 * 60))
  }
}

fn default_interval_hours() -> u64 {
  6
}

fn default_startup_delay_secs() -> u64 {
  15
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VIGIA"))
    .build()
    .context("failed to read config file")?;

  let cfg: DaemonConfig = settings
    .try_deserialize()
    .context("failed to deserialise DaemonConfig")?;

  // Open the store and load the catalog.
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let store = Arc::new(store);

  let catalog = store
    .load_catalog()
    .await
    .context("failed to load state catalog")?;

  let reconciler = Arc::new(Reconciler::new(store, catalog));

  if cli.run_once {
    let summary = reconciler
      .run(None, RunMode::Manual)
      .await
      .context("reconciliation failed")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    return Ok(());
  }

  let mut scheduler = Scheduler::new(reconciler)
    .with_period(cfg.reconcile_period()?)
    .with_startup_delay(Duration::from_secs(cfg.startup_delay_secs));
  scheduler.start();
  tracing::info!(
    interval_hours = cfg.reconcile_interval_hours,
    "reconciliation scheduler started"
  );

  tokio::signal::ctrl_c()
    .await
    .context("failed to listen for shutdown signal")?;
  tracing::info!("shutting down");
  scheduler.stop();

  Ok(())
}
