//! doRiNA standalone worker
//!
//! Pulls jobs from the shared queue and runs them, for deployments where the
//! HTTP server is started with `WORKER_EMBEDDED=false`. Reads the same
//! environment as the server; flags override it.
//!
//! Usage:
//!   dorina-worker --concurrency 4
//!   dorina-worker --drain            # run what is queued, then exit

use anyhow::{Context, Result};
use clap::Parser;
use dorina_common::logging::{init_logging, LogConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use dorina_server::{
    config::{Config, StoreBackend},
    engine::CommandEngine,
    jobs::{JobQueue, PoolConfig, WorkerContext, WorkerPool},
    store,
};

#[derive(Parser, Debug)]
#[command(name = "dorina-worker")]
#[command(author, version, about = "Runs queued doRiNA analysis jobs", long_about = None)]
struct Cli {
    /// Number of jobs run at once
    #[arg(short, long, env = "WORKER_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Analysis engine command line
    #[arg(short, long, env = "DORINA_ENGINE_CMD")]
    engine: Option<String>,

    /// Per-job timeout in seconds
    #[arg(long, env = "JOB_TIMEOUT")]
    job_timeout: Option<u64>,

    /// Process the jobs already queued, then exit
    #[arg(long)]
    drain: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .log_file_prefix("dorina-worker".to_string())
        .filter_directives("dorina_server=debug".to_string())
        .build()
        .merge_env()?;
    let _log_guard = init_logging(&log_config)?;

    let mut config = Config::load()?;
    if let Some(concurrency) = cli.concurrency {
        config.worker.concurrency = concurrency;
    }
    if let Some(engine) = cli.engine {
        config.worker.engine_command = engine;
    }
    if let Some(secs) = cli.job_timeout {
        config.worker.job_timeout_secs = secs;
    }
    config.validate()?;

    if config.store.backend == StoreBackend::Memory {
        anyhow::bail!("dorina-worker needs a shared store; set STORE_BACKEND=redis");
    }

    let store = store::connect(&config.store)
        .await
        .context("Failed to connect to the key-value store")?;
    let engine = CommandEngine::from_command_line(&config.worker.engine_command)
        .context("DORINA_ENGINE_CMD is empty")?;

    let pool = WorkerPool::new(
        JobQueue::new(store.clone()),
        WorkerContext::from_config(store, Arc::new(engine), &config),
        PoolConfig::from(&config.worker),
    );

    if cli.drain {
        let processed = pool.drain().await;
        info!(processed, "Queue drained");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let handles = pool.spawn(shutdown.clone());
    info!(workers = handles.len(), "doRiNA worker running");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to install Ctrl+C handler")?;
    info!("Received Ctrl+C, letting running jobs finish");

    shutdown.cancel();
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!("Worker ended abnormally: {}", e);
        }
    }

    info!("doRiNA worker stopped");
    Ok(())
}
