//! Full analysis job

use dorina_common::types::{sort_by_score_desc, ResultRow};
use tracing::{info, warn};

use super::{
    results::{publish, Publication},
    AnalyseJob, JobError, WorkerContext,
};
use crate::engine::AnalysisRequest;

/// Run the engine for one query and cache the sorted rows.
///
/// Engine failures are stored as a single failed-job row; only store errors
/// end the job with an error.
#[tracing::instrument(
    skip(ctx, job),
    fields(session_id = %job.session_id, genome = %job.query.genome)
)]
pub async fn run_analyse(ctx: &WorkerContext, job: AnalyseJob) -> Result<usize, JobError> {
    let upload = ctx.sessions.custom_regulator_path(&job.session_id);
    let query = job
        .query
        .with_custom_regulator(&job.session_id, &upload.to_string_lossy());
    let request = AnalysisRequest::from(&query);

    let mut rows = match ctx.engine.analyse(&job.datadir, &request).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "Analysis failed");
            vec![ResultRow::job_failed(&e.to_string())]
        },
    };
    sort_by_score_desc(&mut rows);
    info!(rows = rows.len(), "Analysis finished");

    publish(
        ctx,
        Publication {
            result_key: &job.cache_key,
            pending_key: &job.pending_key,
            session_id: &job.session_id,
        },
        rows,
    )
    .await
}
