use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::{
    features::FeatureState,
    jobs::results::decode_rows,
    store::StoreError,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    /// Stored rows, one JSON document per line
    #[default]
    Raw,
    /// Six-column BED
    Bed,
}

impl DownloadFormat {
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Raw => "dorina.tsv",
            Self::Bed => "dorina.bed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResultsQuery {
    pub uuid: String,
    pub format: DownloadFormat,
}

#[derive(Debug, Clone)]
pub struct DownloadResultsResponse {
    pub filename: &'static str,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadResultsError {
    #[error("No results for session {0}")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Corrupt result row: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Request<Result<DownloadResultsResponse, DownloadResultsError>> for DownloadResultsQuery {}

impl crate::cqrs::middleware::Query for DownloadResultsQuery {}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: FeatureState,
    query: DownloadResultsQuery,
) -> Result<DownloadResultsResponse, DownloadResultsError> {
    let result_key = state
        .sessions
        .resolve(&query.uuid)
        .await?
        .ok_or_else(|| DownloadResultsError::NotFound(query.uuid.clone()))?;

    let stored = state.store.lrange(&result_key, 0, -1).await?;
    if stored.is_empty() {
        return Err(DownloadResultsError::NotFound(query.uuid));
    }

    let mut body = String::new();
    match query.format {
        DownloadFormat::Raw => {
            for row in &stored {
                body.push_str(row);
                body.push('\n');
            }
        },
        DownloadFormat::Bed => {
            let rows = decode_rows(&stored)?;
            for row in rows.iter().filter(|r| !r.is_no_results() && !r.is_job_failure()) {
                match row.to_bed_line() {
                    Ok(line) => {
                        body.push_str(&line);
                        body.push('\n');
                    },
                    Err(e) => tracing::warn!(error = %e, "Skipping row without a location"),
                }
            }
        },
    }

    Ok(DownloadResultsResponse {
        filename: query.format.filename(),
        body,
    })
}
