//! Removal of scratch directories left behind by expired sessions

use std::{path::PathBuf, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::SessionTracker;
use crate::{config::SESSION_DIR_PREFIX, store::StoreResult};

/// Directories younger than this may belong to a session whose record is
/// still being written
const DEFAULT_GRACE: Duration = Duration::from_secs(60);

/// Periodically deletes `<session store>/dorina-<uuid>` directories whose
/// session record no longer exists
pub struct SessionJanitor {
    tracker: SessionTracker,
    session_store: PathBuf,
    interval: Duration,
    grace: Duration,
}

impl SessionJanitor {
    pub fn new(tracker: SessionTracker, session_store: PathBuf, interval: Duration) -> Self {
        Self {
            tracker,
            session_store,
            interval,
            grace: DEFAULT_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Sweep until cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            path = %self.session_store.display(),
            interval_secs = self.interval.as_secs(),
            "Session janitor started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.sweep().await {
                        Ok(0) => {},
                        Ok(removed) => info!(removed, "Removed expired session directories"),
                        Err(e) => warn!(error = %e, "Session sweep failed"),
                    }
                },
            }
        }
        info!("Session janitor stopped");
    }

    /// One pass over the session store. Returns how many directories were removed.
    ///
    /// Listing the live sessions also lets the memory backend drop every
    /// expired key, including ones nothing reads again.
    pub async fn sweep(&self) -> StoreResult<usize> {
        let live = self.tracker.live_sessions().await?;

        let mut entries = match tokio::fs::read_dir(&self.session_store).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.session_store.display(), error = %e, "Cannot read session store");
                return Ok(0);
            },
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read session store entry");
                    break;
                },
            };

            let name = entry.file_name();
            let Some(session_id) = name.to_str().and_then(|n| n.strip_prefix(SESSION_DIR_PREFIX))
            else {
                continue;
            };
            if live.contains(session_id) {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_dir() || self.is_fresh(&metadata) {
                continue;
            }

            match tokio::fs::remove_dir_all(entry.path()).await {
                Ok(()) => {
                    debug!(session_id, "Removed expired session directory");
                    removed += 1;
                },
                Err(e) => warn!(session_id, error = %e, "Failed to remove session directory"),
            }
        }

        Ok(removed)
    }

    fn is_fresh(&self, metadata: &std::fs::Metadata) -> bool {
        match metadata.modified().map(|at| at.elapsed()) {
            Ok(Ok(age)) => age < self.grace,
            // Unknown or future mtime
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::PathConfig,
        store::{KeyValueStore, MemoryStore},
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sweep_removes_only_expired_sessions() {
        let scratch = tempfile::tempdir().unwrap();
        let tracker = SessionTracker::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(60),
            PathConfig {
                data_path: PathBuf::from("/data"),
                session_store: scratch.path().to_path_buf(),
            },
        );

        let live = tracker.create_session(true).await.unwrap();
        let orphan = scratch.path().join("dorina-gone");
        std::fs::create_dir_all(&orphan).unwrap();
        let unrelated = scratch.path().join("other-dir");
        std::fs::create_dir_all(&unrelated).unwrap();

        let janitor = SessionJanitor::new(
            tracker.clone(),
            scratch.path().to_path_buf(),
            Duration::from_secs(60),
        )
        .with_grace(Duration::ZERO);
        assert_eq!(janitor.sweep().await.unwrap(), 1);

        assert!(tracker.session_dir(&live).is_dir());
        assert!(!orphan.exists());
        assert!(unrelated.exists());
    }

    #[tokio::test]
    async fn test_fresh_directories_are_kept() {
        let scratch = tempfile::tempdir().unwrap();
        let tracker = SessionTracker::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(60),
            PathConfig {
                data_path: PathBuf::from("/data"),
                session_store: scratch.path().to_path_buf(),
            },
        );
        let just_made = scratch.path().join("dorina-being-created");
        std::fs::create_dir_all(&just_made).unwrap();

        let janitor =
            SessionJanitor::new(tracker, scratch.path().to_path_buf(), Duration::from_secs(60));
        assert_eq!(janitor.sweep().await.unwrap(), 0);
        assert!(just_made.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_expired_keys_from_memory_store() {
        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let tracker = SessionTracker::new(
            store.clone(),
            Duration::from_secs(60),
            PathConfig {
                data_path: PathBuf::from("/data"),
                session_store: scratch.path().to_path_buf(),
            },
        );
        let kept = tracker.create_session(false).await.unwrap();
        // Never read again once expired
        store
            .set_ex("results:sessions:gone", "{}", Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        let janitor =
            SessionJanitor::new(tracker.clone(), scratch.path().to_path_buf(), Duration::from_secs(60));
        janitor.sweep().await.unwrap();

        assert_eq!(store.keys_with_prefix("").await.unwrap(), vec![format!("sessions:{}", kept)]);
    }

    #[tokio::test]
    async fn test_sweep_missing_store_is_noop() {
        let tracker = SessionTracker::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(60),
            PathConfig {
                data_path: PathBuf::from("/data"),
                session_store: PathBuf::from("/nonexistent/dorina"),
            },
        );
        let janitor = SessionJanitor::new(
            tracker,
            PathBuf::from("/nonexistent/dorina"),
            Duration::from_secs(60),
        );
        assert_eq!(janitor.sweep().await.unwrap(), 0);
    }
}
