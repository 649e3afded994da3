//! doRiNA Server Library
//!
//! HTTP backend for searching regulatory elements (RNA-binding protein and
//! miRNA binding sites) overlapping genes.
//!
//! # Overview
//!
//! - **API**: form-based search, session polling, result paging, catalog lookups
//! - **Store**: a key-value store (redis, or in-process for development) holding
//!   sessions, cached result lists, in-flight markers, and the job queue
//! - **Workers**: tokio tasks that run the analysis engine and publish results
//! - **Configuration**: environment-based, see [`config::Config`]
//!
//! # Architecture
//!
//! Request handling follows a **CQRS** split:
//!
//! - **Commands** change state: dispatching a search, starting a session
//! - **Queries** read state: status, result pages, catalog listings
//!
//! A search is canonicalized into a cache key. Identical searches share one
//! result list; while it is being computed, every session waiting on it
//! polls `/status` until the list appears.
//!
//! # Example
//!
//! ```no_run
//! use dorina_server::{api, config::Config, features::FeatureState, store};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(Config::load()?);
//!     let store = store::connect(&config.store).await?;
//!     let app = api::create_router(FeatureState::new(store, config.clone()), &config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod cqrs;
pub mod engine;
pub mod error;
pub mod features;
pub mod jobs;
pub mod middleware;
pub mod query;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use error::{AppError, ServerResult};
