use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::{
    features::FeatureState,
    jobs::{AnalyseJob, FilterGenesJob, Job, JobError},
    query::{CanonicalQuery, QueryError},
    session::{SessionError, SessionState},
    store::StoreError,
};

/// Session id clients send before they have one
pub const INVALID_SESSION: &str = "invalid";

#[derive(Debug, Clone)]
pub struct DispatchSearchCommand {
    pub canonical: CanonicalQuery,
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSearchResponse {
    pub state: SessionState,
    pub uuid: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchSearchError {
    #[error("{0}")]
    Validation(#[from] QueryError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Queue error: {0}")]
    Queue(#[from] JobError),
    #[error("{0}")]
    Session(#[from] SessionError),
}

impl Request<Result<DispatchSearchResponse, DispatchSearchError>> for DispatchSearchCommand {}

impl crate::cqrs::middleware::Command for DispatchSearchCommand {}

/// Reuse the caller's session if it is still live, otherwise start one
async fn resolve_session(
    state: &FeatureState,
    uuid: Option<&str>,
) -> Result<String, DispatchSearchError> {
    if let Some(id) = uuid.filter(|id| !id.is_empty() && *id != INVALID_SESSION) {
        if state.sessions.exists(id).await? {
            return Ok(id.to_string());
        }
    }
    Ok(state.sessions.create_session(false).await?)
}

/// Mark a session as waiting on `result_key`.
///
/// The pointer is written up front so a session that joins a computation
/// already in flight still finds the list once another worker fills it.
async fn mark_pending(
    state: &FeatureState,
    session_id: &str,
    result_key: &str,
) -> Result<DispatchSearchResponse, DispatchSearchError> {
    state.sessions.set_state(session_id, SessionState::Pending).await?;
    state.sessions.point_to(session_id, result_key).await?;
    Ok(DispatchSearchResponse {
        state: SessionState::Pending,
        uuid: session_id.to_string(),
    })
}

/// Atomically take the in-flight marker; false if another request holds it
async fn claim(state: &FeatureState, pending_key: &str) -> Result<bool, DispatchSearchError> {
    Ok(state
        .store
        .set_nx_ex(pending_key, "1", state.config.cache.pending_ttl())
        .await?)
}

#[tracing::instrument(skip(state, command), fields(key = %command.canonical))]
pub async fn handle(
    state: FeatureState,
    command: DispatchSearchCommand,
) -> Result<DispatchSearchResponse, DispatchSearchError> {
    let session_id = resolve_session(&state, command.uuid.as_deref()).await?;
    let canonical = command.canonical;
    let cache = &state.config.cache;

    if state.store.exists(&canonical.cache_key).await? {
        state.store.expire(&canonical.cache_key, cache.result_ttl()).await?;
        state.sessions.set_state(&session_id, SessionState::Done).await?;
        state.sessions.point_to(&session_id, &canonical.cache_key).await?;
        tracing::info!(session_id = %session_id, "Cache hit");
        return Ok(DispatchSearchResponse {
            state: SessionState::Done,
            uuid: session_id,
        });
    }

    if !canonical.query.genes.is_all() {
        let full = canonical.full();
        if state.store.exists(&full.cache_key).await? {
            state.store.expire(&full.cache_key, cache.result_ttl()).await?;
            let response = mark_pending(&state, &session_id, &canonical.cache_key).await?;

            if claim(&state, &canonical.pending_key).await? {
                let job_id = state
                    .queue
                    .enqueue(Job::FilterGenes(FilterGenesJob {
                        genes: canonical.query.genes.to_vec(),
                        full_key: full.cache_key,
                        target_key: canonical.cache_key,
                        pending_key: canonical.pending_key,
                        session_id: session_id.clone(),
                    }))
                    .await?;
                tracing::info!(session_id = %session_id, job_id = %job_id, "Gene filter queued");
            } else {
                tracing::debug!(session_id = %session_id, "Gene filter already in flight");
            }
            return Ok(response);
        }
        // No cached full result: compute the filtered query directly
    }

    let response = mark_pending(&state, &session_id, &canonical.cache_key).await?;

    if !claim(&state, &canonical.pending_key).await? {
        tracing::debug!(session_id = %session_id, "Analysis already in flight");
        return Ok(response);
    }

    let job_id = state
        .queue
        .enqueue(Job::Analyse(AnalyseJob {
            datadir: state.config.paths.data_path.clone(),
            cache_key: canonical.cache_key,
            pending_key: canonical.pending_key,
            query: canonical.query,
            session_id: session_id.clone(),
        }))
        .await?;
    tracing::info!(session_id = %session_id, job_id = %job_id, "Analysis queued");

    Ok(response)
}
