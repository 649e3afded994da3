//! Feature modules implementing the doRiNA search API
//!
//! Each feature is a vertical slice with its own commands, queries, and
//! routes, following the CQRS split between writes and reads.
//!
//! # Features
//!
//! - **search**: validates a search and dispatches (or reuses) its job
//! - **sessions**: session creation, custom regulator upload, status polling
//! - **results**: paging through and downloading a session's results
//! - **catalog**: genomes, assemblies, regulators, genes, and tissues
//!
//! Successful responses are plain JSON bodies, since browser clients poll
//! them directly. Errors use the shared [`ErrorResponse`] envelope.
//!
//! [`ErrorResponse`]: crate::api::response::ErrorResponse

pub mod catalog;
pub mod results;
pub mod search;
pub mod sessions;
pub mod shared;

use axum::Router;
use std::sync::Arc;

use crate::{
    catalog::Catalog, config::Config, jobs::JobQueue, session::SessionTracker, store::SharedStore,
};

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Key-value store holding sessions, caches, and the job queue
    pub store: SharedStore,
    pub sessions: SessionTracker,
    pub queue: JobQueue,
    /// Genomes and regulators on disk
    pub catalog: Catalog,
    pub config: Arc<Config>,
}

impl FeatureState {
    /// Wire up state from a store and configuration
    pub fn new(store: SharedStore, config: Arc<Config>) -> Self {
        Self {
            sessions: SessionTracker::new(
                store.clone(),
                config.cache.session_ttl(),
                config.paths.clone(),
            ),
            queue: JobQueue::new(store.clone()),
            catalog: Catalog::new(config.paths.data_path.clone()),
            store,
            config,
        }
    }
}

/// Creates the API router with all feature routes mounted
///
/// Routes keep the paths browser clients already use:
/// - `/search` - dispatch a search
/// - `/go`, `/status/:uuid` - sessions
/// - `/result/...`, `/download/results/:uuid` - results
/// - `/genomes`, `/assemblies/...`, `/regulators/...`, `/genes/...`,
///   `/tissues/...`, `/download/regulator/...` - catalog
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(search::search_routes())
        .merge(sessions::sessions_routes())
        .merge(results::results_routes())
        .merge(catalog::catalog_routes())
        .with_state(state)
}
