//! Session tracking
//!
//! A session is a short-lived record `{uuid, state}` under `sessions:<uuid>`.
//! Clients poll it while a job runs. `expired` is never written: it is what
//! [`SessionTracker::get_status`] reports once the record has aged out.
//!
//! When a session's job finishes, the worker also writes a result pointer
//! `{redirect: <cache key>}` under `results:sessions:<uuid>`, which is how
//! the result routes find the list to page through.

use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::PathBuf, time::Duration};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::PathConfig,
    store::{keys, ttl_secs, SharedStore, StoreError, StoreResult},
};

mod janitor;

pub use janitor::SessionJanitor;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cannot create session directory {}: {source}", path.display())]
    UploadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Initialised,
    Pending,
    Done,
    Expired,
}

/// Stored session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub uuid: String,
    pub state: SessionState,
}

/// Session record as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub uuid: String,
    pub state: SessionState,
    /// Remaining lifetime in seconds; absent for expired sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

/// Maps a session to the result list it should read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPointer {
    pub redirect: String,
}

/// Reads and writes session records and result pointers
#[derive(Clone)]
pub struct SessionTracker {
    store: SharedStore,
    session_ttl: Duration,
    paths: PathConfig,
}

impl SessionTracker {
    pub fn new(store: SharedStore, session_ttl: Duration, paths: PathConfig) -> Self {
        Self {
            store,
            session_ttl,
            paths,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Scratch directory for a session's uploads
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.paths.session_dir(session_id)
    }

    /// Where a session's uploaded regulator file lives
    pub fn custom_regulator_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(format!("{}.bed", session_id))
    }

    /// Start a new session, optionally with a scratch directory for uploads.
    ///
    /// The directory is created before the record, so a session that needs
    /// one never exists without it.
    #[tracing::instrument(skip(self))]
    pub async fn create_session(&self, needs_upload_dir: bool) -> Result<String, SessionError> {
        let session_id = Uuid::new_v4().to_string();

        if needs_upload_dir {
            let dir = self.session_dir(&session_id);
            if let Err(source) = tokio::fs::create_dir_all(&dir).await {
                tracing::error!(path = %dir.display(), error = %source, "Failed to create session directory");
                return Err(SessionError::UploadDir { path: dir, source });
            }
        }
        self.set_state(&session_id, SessionState::Initialised).await?;

        tracing::debug!(session_id = %session_id, "Session created");
        Ok(session_id)
    }

    /// Drop a session record and its scratch directory
    pub async fn discard(&self, session_id: &str) -> StoreResult<()> {
        self.store.delete(&keys::session(session_id)).await?;
        let dir = self.session_dir(session_id);
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to remove session directory");
            }
        }
        Ok(())
    }

    /// Ids of every live session
    pub async fn live_sessions(&self) -> StoreResult<HashSet<String>> {
        let keys = self.store.keys_with_prefix(keys::SESSIONS_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(keys::SESSIONS_PREFIX).map(str::to_string))
            .collect())
    }

    /// Whether a session record is still live
    pub async fn exists(&self, session_id: &str) -> StoreResult<bool> {
        self.store.exists(&keys::session(session_id)).await
    }

    /// Overwrite a session's state and restart its lifetime
    pub async fn set_state(&self, session_id: &str, state: SessionState) -> StoreResult<()> {
        let record = SessionRecord {
            uuid: session_id.to_string(),
            state,
        };
        let value = serde_json::to_string(&record)?;
        self.store
            .set_ex(&keys::session(session_id), &value, self.session_ttl)
            .await
    }

    /// Current state plus remaining lifetime, or `expired` once the record is gone.
    ///
    /// A pending session whose result list is complete (present, with no
    /// in-flight marker left) is reported and stored as done. This covers
    /// sessions that joined a computation started by another session, whose
    /// worker only updates its own.
    pub async fn get_status(&self, session_id: &str) -> StoreResult<SessionStatus> {
        let key = keys::session(session_id);
        let expired = SessionStatus {
            uuid: session_id.to_string(),
            state: SessionState::Expired,
            ttl: None,
        };

        let Some(raw) = self.store.get(&key).await? else {
            return Ok(expired);
        };
        let mut record: SessionRecord = serde_json::from_str(&raw)?;

        if record.state == SessionState::Pending && self.results_ready(session_id).await? {
            self.set_state(session_id, SessionState::Done).await?;
            record.state = SessionState::Done;
        }

        let ttl = self.store.ttl(&key).await?.map(ttl_secs);
        Ok(SessionStatus {
            uuid: record.uuid,
            state: record.state,
            ttl,
        })
    }

    async fn results_ready(&self, session_id: &str) -> StoreResult<bool> {
        match self.resolve(session_id).await? {
            Some(result_key) => Ok(self.store.exists(&result_key).await?
                && !self.store.exists(&keys::pending(&result_key)).await?),
            None => Ok(false),
        }
    }

    /// Point a session at the result list it should read
    pub async fn point_to(&self, session_id: &str, result_key: &str) -> StoreResult<()> {
        let pointer = ResultPointer {
            redirect: result_key.to_string(),
        };
        let value = serde_json::to_string(&pointer)?;
        self.store
            .set_ex(&keys::session_result(session_id), &value, self.session_ttl)
            .await
    }

    /// The result list a session points at, if the pointer is still live
    pub async fn resolve(&self, session_id: &str) -> StoreResult<Option<String>> {
        match self.store.get(&keys::session_result(session_id)).await? {
            Some(raw) => {
                let pointer: ResultPointer = serde_json::from_str(&raw)?;
                Ok(Some(pointer.redirect))
            },
            None => Ok(None),
        }
    }
}
