//! Worker pool draining the job queue
//!
//! Each worker is a tokio task polling the queue. Jobs run under a wall-clock
//! timeout; a job that overruns is abandoned and its pending marker is left to
//! expire on its own, after which the search can be dispatched again.

use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{run_job, JobEnvelope, JobQueue, WorkerContext};
use crate::config::WorkerConfig;

/// Worker pool tuning
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub concurrency: usize,
    pub job_timeout: Duration,
    pub poll_interval: Duration,
}

impl From<&WorkerConfig> for PoolConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            job_timeout: config.job_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// What happened to a dequeued job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed,
    TimedOut,
}

pub struct WorkerPool {
    queue: JobQueue,
    ctx: Arc<WorkerContext>,
    config: PoolConfig,
}

impl WorkerPool {
    pub fn new(queue: JobQueue, ctx: WorkerContext, config: PoolConfig) -> Self {
        Self {
            queue,
            ctx: Arc::new(ctx),
            config,
        }
    }

    /// Spawn `concurrency` workers that run until `shutdown` is cancelled
    pub fn spawn(self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let pool = Arc::new(self);
        info!(
            concurrency = pool.config.concurrency,
            job_timeout_secs = pool.config.job_timeout.as_secs(),
            "Starting worker pool"
        );

        (0..pool.config.concurrency.max(1))
            .map(|worker| {
                let pool = Arc::clone(&pool);
                let shutdown = shutdown.clone();
                tokio::spawn(async move { pool.worker_loop(worker, shutdown).await })
            })
            .collect()
    }

    async fn worker_loop(&self, worker: usize, shutdown: CancellationToken) {
        debug!(worker, "Worker started");
        while !shutdown.is_cancelled() {
            let idle = match self.queue.dequeue().await {
                Ok(Some(envelope)) => {
                    self.execute(envelope).await;
                    false
                },
                Ok(None) => true,
                Err(e) => {
                    error!(worker, error = %e, "Failed to poll job queue");
                    true
                },
            };

            if idle {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {},
                }
            }
        }
        debug!(worker, "Worker stopped");
    }

    /// Run one job under the pool's timeout
    #[tracing::instrument(skip(self, envelope), fields(job_id = %envelope.id, kind = envelope.job.kind()))]
    pub async fn execute(&self, envelope: JobEnvelope) -> JobOutcome {
        let pending_key = envelope.job.pending_key().to_string();
        match tokio::time::timeout(self.config.job_timeout, run_job(&self.ctx, envelope.job)).await
        {
            Ok(Ok(rows)) => {
                info!(rows, "Job completed");
                JobOutcome::Completed
            },
            Ok(Err(e)) => {
                error!(error = %e, "Job failed");
                JobOutcome::Failed
            },
            Err(_) => {
                warn!(
                    pending_key = %pending_key,
                    timeout_secs = self.config.job_timeout.as_secs(),
                    "Job timed out; pending marker left to expire"
                );
                JobOutcome::TimedOut
            },
        }
    }

    /// Run queued jobs on the calling task until the queue is empty
    pub async fn drain(&self) -> usize {
        let mut processed = 0;
        loop {
            match self.queue.dequeue().await {
                Ok(Some(envelope)) => {
                    self.execute(envelope).await;
                    processed += 1;
                },
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to poll job queue");
                    break;
                },
            }
        }
        processed
    }
}
