//! Background jobs
//!
//! Two kinds of job are queued by the search dispatcher:
//!
//! - [`AnalyseJob`]: run the analysis engine for a query and cache its rows
//! - [`FilterGenesJob`]: derive a gene-filtered result list from an already
//!   cached unfiltered one
//!
//! Both finish the same way (see [`results::publish`]): rows are written in
//! batches, the result TTL is set, the session is marked done and pointed at
//! the list, and only then is the in-flight marker cleared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::Config,
    engine::AnalysisEngine,
    query::Query,
    session::SessionTracker,
    store::{SharedStore, StoreError},
};

pub mod analyse;
pub mod filter;
pub mod queue;
pub mod results;
pub mod worker;

pub use queue::JobQueue;
pub use worker::{PoolConfig, WorkerPool};

/// Errors a job can end with. Engine failures never show up here: they are
/// stored as a failed-job row instead.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Full analysis of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyseJob {
    pub datadir: PathBuf,
    pub cache_key: String,
    pub pending_key: String,
    pub query: Query,
    pub session_id: String,
}

/// Gene filter over a cached unfiltered result list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGenesJob {
    pub genes: Vec<String>,
    pub full_key: String,
    pub target_key: String,
    pub pending_key: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    Analyse(AnalyseJob),
    FilterGenes(FilterGenesJob),
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Analyse(_) => "analyse",
            Self::FilterGenes(_) => "filter_genes",
        }
    }

    pub fn pending_key(&self) -> &str {
        match self {
            Self::Analyse(job) => &job.pending_key,
            Self::FilterGenes(job) => &job.pending_key,
        }
    }
}

/// Queue payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub id: Uuid,
    pub enqueued_at: DateTime<Utc>,
    pub job: Job,
}

impl JobEnvelope {
    pub fn new(job: Job) -> Self {
        Self {
            id: Uuid::new_v4(),
            enqueued_at: Utc::now(),
            job,
        }
    }
}

/// Everything a job needs to run
#[derive(Clone)]
pub struct WorkerContext {
    pub store: SharedStore,
    pub sessions: SessionTracker,
    pub engine: Arc<dyn AnalysisEngine>,
    pub result_ttl: Duration,
    pub batch_size: usize,
}

impl WorkerContext {
    pub fn from_config(
        store: SharedStore,
        engine: Arc<dyn AnalysisEngine>,
        config: &Config,
    ) -> Self {
        Self {
            sessions: SessionTracker::new(
                store.clone(),
                config.cache.session_ttl(),
                config.paths.clone(),
            ),
            store,
            engine,
            result_ttl: config.cache.result_ttl(),
            batch_size: config.worker.batch_size,
        }
    }
}

/// Run one job to completion
pub async fn run_job(ctx: &WorkerContext, job: Job) -> Result<usize, JobError> {
    match job {
        Job::Analyse(job) => analyse::run_analyse(ctx, job).await,
        Job::FilterGenes(job) => filter::filter_genes(ctx, job).await,
    }
}
