//! doRiNA Server - Main entry point

use anyhow::{Context, Result};
use dorina_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use dorina_server::{
    api,
    config::Config,
    engine::CommandEngine,
    features::FeatureState,
    jobs::{JobQueue, PoolConfig, WorkerContext, WorkerPool},
    session::SessionJanitor,
    store,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("dorina-server".to_string())
        .filter_directives("dorina_server=debug,tower_http=debug,axum=info".to_string())
        .build()
        // Environment variables take precedence
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting doRiNA Server");

    let config = Arc::new(Config::load()?);
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let store = store::connect(&config.store)
        .await
        .context("Failed to connect to the key-value store")?;
    store.ping().await.context("Key-value store did not answer PING")?;

    let shutdown = CancellationToken::new();
    let mut background = Vec::new();

    if config.worker.embedded {
        let engine = CommandEngine::from_command_line(&config.worker.engine_command)
            .context("DORINA_ENGINE_CMD is empty")?;
        let pool = WorkerPool::new(
            JobQueue::new(store.clone()),
            WorkerContext::from_config(store.clone(), Arc::new(engine), &config),
            PoolConfig::from(&config.worker),
        );
        background.extend(pool.spawn(shutdown.clone()));
    } else {
        info!("Embedded workers disabled (WORKER_EMBEDDED=false); run dorina-worker separately");
    }

    let state = FeatureState::new(store, config.clone());

    let janitor = SessionJanitor::new(
        state.sessions.clone(),
        config.paths.session_store.clone(),
        config.worker.janitor_interval(),
    );
    background.push(tokio::spawn(janitor.run(shutdown.clone())));

    let app = api::create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    // Workers finish the job in hand before stopping
    shutdown.cancel();
    for handle in background {
        if let Err(e) = handle.await {
            tracing::error!("Background task ended abnormally: {}", e);
        }
    }

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give ongoing requests time to complete
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
