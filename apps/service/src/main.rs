use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use upcheck::{Prober, ResultStore, SweepController};

mod config;
mod db;
mod pool;

use config::Config;
use db::LibsqlStore;

#[derive(Debug, Parser)]
#[command(name = "upcheck-service", about = "Background URL availability sweeper")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single sweep and exit
    #[arg(long)]
    once: bool,

    /// Sweep every tracked URL, not only the stale ones
    #[arg(long)]
    check_all: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_config(cli.config.as_ref())?;
    if cli.check_all {
        config.sweep.check_all = true;
    }
    info!("{config}");

    let pool = pool::open_pool(&config.database.path).await?;
    {
        let conn = pool.get().await?;
        db::initialize_database(&conn).await?;
    }

    let store: Arc<dyn ResultStore> = Arc::new(LibsqlStore::new(pool));
    let prober = Arc::new(Prober::new(config.prober_config())?);
    let controller = SweepController::new(prober, store, config.sweep_config());

    if cli.once {
        if let Some(run) = controller.run_once().await {
            info!(
                total = run.total,
                succeeded = run.succeeded,
                failed = run.failed,
                "single sweep done"
            );
        }
        return Ok(());
    }

    let timer = if config.sweep.auto_start {
        controller.clone().start()
    } else {
        info!("auto start disabled, sweeps must be triggered manually");
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    controller.shutdown();
    if let Some(timer) = timer {
        timer.abort();
    }

    Ok(())
}
