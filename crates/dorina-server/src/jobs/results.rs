//! Writing finished result lists

use dorina_common::types::ResultRow;
use tracing::info;

use super::{JobError, WorkerContext};
use crate::session::SessionState;

/// Where a finished job's rows go
#[derive(Debug, Clone, Copy)]
pub struct Publication<'a> {
    pub result_key: &'a str,
    pub pending_key: &'a str,
    pub session_id: &'a str,
}

/// Store `rows` under the result key and hand it to the session.
///
/// An empty list is replaced by the no-results row so the key still exists.
/// Rows are appended `ctx.batch_size` at a time. The pending marker is
/// deleted after everything else, so a poller that no longer sees it is
/// guaranteed to find the results. Returns the number of rows written.
pub async fn publish(
    ctx: &WorkerContext,
    target: Publication<'_>,
    mut rows: Vec<ResultRow>,
) -> Result<usize, JobError> {
    if rows.is_empty() {
        rows.push(ResultRow::no_results());
    }

    let encoded = rows
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;

    for batch in encoded.chunks(ctx.batch_size.max(1)) {
        ctx.store.rpush(target.result_key, batch).await?;
    }
    ctx.store.expire(target.result_key, ctx.result_ttl).await?;

    ctx.sessions.set_state(target.session_id, SessionState::Done).await?;
    ctx.sessions.point_to(target.session_id, target.result_key).await?;

    ctx.store.delete(target.pending_key).await?;

    info!(
        session_id = target.session_id,
        rows = encoded.len(),
        "Results published"
    );
    Ok(encoded.len())
}

/// Decode a stored result list
pub fn decode_rows(raw: &[String]) -> Result<Vec<ResultRow>, serde_json::Error> {
    raw.iter().map(|row| serde_json::from_str(row)).collect()
}
