//! Job queue on a store list

use uuid::Uuid;

use super::{Job, JobEnvelope, JobError};
use crate::store::{keys, SharedStore};

/// FIFO of [`JobEnvelope`]s shared by the server and every worker
#[derive(Clone)]
pub struct JobQueue {
    store: SharedStore,
    key: String,
}

impl JobQueue {
    pub fn new(store: SharedStore) -> Self {
        Self::with_key(store, keys::JOB_QUEUE)
    }

    pub fn with_key(store: SharedStore, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    #[tracing::instrument(skip(self, job), fields(kind = job.kind()))]
    pub async fn enqueue(&self, job: Job) -> Result<Uuid, JobError> {
        let envelope = JobEnvelope::new(job);
        let payload = serde_json::to_string(&envelope)?;
        let depth = self.store.rpush(&self.key, &[payload]).await?;
        tracing::debug!(job_id = %envelope.id, depth, "Job enqueued");
        Ok(envelope.id)
    }

    /// Take the oldest job, skipping payloads that do not decode
    pub async fn dequeue(&self) -> Result<Option<JobEnvelope>, JobError> {
        while let Some(payload) = self.store.lpop(&self.key).await? {
            match serde_json::from_str::<JobEnvelope>(&payload) {
                Ok(envelope) => return Ok(Some(envelope)),
                Err(e) => tracing::error!(error = %e, "Dropping undecodable job payload"),
            }
        }
        Ok(None)
    }

    pub async fn len(&self) -> Result<usize, JobError> {
        Ok(self.store.llen(&self.key).await?)
    }

    pub async fn is_empty(&self) -> Result<bool, JobError> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{jobs::FilterGenesJob, store::MemoryStore};
    use std::sync::Arc;

    fn job(target: &str) -> Job {
        Job::FilterGenes(FilterGenesJob {
            genes: vec!["g".to_string()],
            full_key: "results:full".to_string(),
            target_key: target.to_string(),
            pending_key: keys::pending(target),
            session_id: "s".to_string(),
        })
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let queue = JobQueue::new(store);
        queue.enqueue(job("results:a")).await.unwrap();
        queue.enqueue(job("results:b")).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 2);

        let first = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(first.job.pending_key(), "results:a_pending");
        let second = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(second.job.pending_key(), "results:b_pending");
        assert!(queue.dequeue().await.unwrap().is_none());
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_skipped() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        store.rpush(keys::JOB_QUEUE, &["not json".to_string()]).await.unwrap();
        let queue = JobQueue::new(store);
        queue.enqueue(job("results:a")).await.unwrap();

        let envelope = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(envelope.job.pending_key(), "results:a_pending");
    }
}
