use mediator::Request;
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::{catalog::GenomeSummary, features::FeatureState};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListGenomesQuery;

#[derive(Debug, Clone, Serialize)]
pub struct ListGenomesResponse {
    pub genomes: Vec<GenomeSummary>,
}

impl Request<Result<ListGenomesResponse, CatalogError>> for ListGenomesQuery {}

impl crate::cqrs::middleware::Query for ListGenomesQuery {}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: FeatureState,
    _query: ListGenomesQuery,
) -> Result<ListGenomesResponse, CatalogError> {
    Ok(ListGenomesResponse {
        genomes: state.catalog.genome_summaries().await?,
    })
}
