//! Gene filter job

use dorina_common::types::ResultRow;
use std::collections::HashSet;
use tracing::{info, warn};

use super::{
    results::{decode_rows, publish, Publication},
    FilterGenesJob, JobError, WorkerContext,
};

/// Keep the rows of the unfiltered list whose gene was requested, in their
/// stored order, and cache them under the filtered key.
#[tracing::instrument(
    skip(ctx, job),
    fields(session_id = %job.session_id, genes = job.genes.len())
)]
pub async fn filter_genes(ctx: &WorkerContext, job: FilterGenesJob) -> Result<usize, JobError> {
    let raw = ctx.store.lrange(&job.full_key, 0, -1).await?;
    if raw.is_empty() {
        warn!(full_key = %job.full_key, "Unfiltered results vanished before filtering");
    }

    let mut all = decode_rows(&raw)?;
    let rows = if all.first().is_some_and(ResultRow::is_job_failure) {
        // The failure carries over to every filtered view of the list
        warn!(full_key = %job.full_key, "Unfiltered analysis failed; passing the failure on");
        all.truncate(1);
        all
    } else {
        let wanted: HashSet<&str> = job.genes.iter().map(String::as_str).collect();
        all.into_iter()
            .filter(|row| wanted.contains(row.gene.as_str()))
            .collect()
    };
    info!(scanned = raw.len(), kept = rows.len(), "Gene filter finished");

    publish(
        ctx,
        Publication {
            result_key: &job.target_key,
            pending_key: &job.pending_key,
            session_id: &job.session_id,
        },
        rows,
    )
    .await
}
