use mediator::Request;
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::{catalog::Assembly, features::FeatureState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAssembliesQuery {
    pub genome: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListAssembliesResponse {
    pub assemblies: Vec<Assembly>,
}

impl Request<Result<ListAssembliesResponse, CatalogError>> for ListAssembliesQuery {}

impl crate::cqrs::middleware::Query for ListAssembliesQuery {}

/// An unknown genome has no assemblies rather than being an error
#[tracing::instrument(skip(state))]
pub async fn handle(
    state: FeatureState,
    query: ListAssembliesQuery,
) -> Result<ListAssembliesResponse, CatalogError> {
    Ok(ListAssembliesResponse {
        assemblies: state.catalog.assemblies(Some(&query.genome)).await?,
    })
}
