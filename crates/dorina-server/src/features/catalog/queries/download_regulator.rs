use mediator::Request;
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::features::FeatureState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRegulatorQuery {
    pub assembly: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct DownloadRegulatorResponse {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Request<Result<DownloadRegulatorResponse, CatalogError>> for DownloadRegulatorQuery {}

impl crate::cqrs::middleware::Query for DownloadRegulatorQuery {}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: FeatureState,
    query: DownloadRegulatorQuery,
) -> Result<DownloadRegulatorResponse, CatalogError> {
    let path = state.catalog.regulator_path(&query.assembly, &query.name).await?;
    let content = tokio::fs::read(&path)
        .await
        .map_err(dorina_common::DorinaError::from)?;

    Ok(DownloadRegulatorResponse {
        filename: format!("{}.bed", query.name),
        content,
    })
}
