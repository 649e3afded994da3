use mediator::Request;
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::features::FeatureState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTissuesQuery {
    pub assembly: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTissuesResponse {
    pub tissue: Vec<String>,
}

impl Request<Result<ListTissuesResponse, CatalogError>> for ListTissuesQuery {}

impl crate::cqrs::middleware::Query for ListTissuesQuery {}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: FeatureState,
    query: ListTissuesQuery,
) -> Result<ListTissuesResponse, CatalogError> {
    Ok(ListTissuesResponse {
        tissue: state.catalog.tissues(&query.assembly).await?,
    })
}
