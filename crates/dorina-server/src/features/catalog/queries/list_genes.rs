use mediator::Request;
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::{features::FeatureState, store::keys};

/// Most genes returned for one lookup
pub const MAX_GENES: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListGenesQuery {
    pub assembly: String,
    /// Gene name prefix; empty lists from the start
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListGenesResponse {
    pub genes: Vec<String>,
}

impl Request<Result<ListGenesResponse, CatalogError>> for ListGenesQuery {}

impl crate::cqrs::middleware::Query for ListGenesQuery {}

/// Lex range matching every member that starts with `prefix`
fn prefix_range(prefix: &str) -> (String, String) {
    let mut chars = prefix.chars();
    let Some(last) = chars.next_back() else {
        return ("-".to_string(), "+".to_string());
    };

    let min = format!("[{}", prefix);
    let max = match char::from_u32(last as u32 + 1) {
        Some(next) => format!("({}{}", chars.as_str(), next),
        None => "+".to_string(),
    };
    (min, max)
}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: FeatureState,
    query: ListGenesQuery,
) -> Result<ListGenesResponse, CatalogError> {
    let cache_key = keys::genes(&query.assembly);

    if !state.store.exists(&cache_key).await? {
        let genes = state.catalog.genes(&query.assembly).await?;
        if !genes.is_empty() {
            state.store.zadd(&cache_key, &genes).await?;
            tracing::info!(assembly = %query.assembly, count = genes.len(), "Gene index loaded");
        }
    }

    let (min, max) = prefix_range(&query.prefix);
    let genes = state
        .store
        .zrangebylex(&cache_key, &min, &max, Some(MAX_GENES))
        .await?;

    Ok(ListGenesResponse { genes })
}
