use mediator::Request;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::CatalogError;
use crate::{features::FeatureState, store::keys};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRegulatorsQuery {
    pub assembly: String,
}

/// Regulator metadata keyed by regulator name
pub type ListRegulatorsResponse = BTreeMap<String, Value>;

impl Request<Result<ListRegulatorsResponse, CatalogError>> for ListRegulatorsQuery {}

impl crate::cqrs::middleware::Query for ListRegulatorsQuery {}

/// Regulators of an assembly, served from the store cache when present.
///
/// Only non-empty listings are cached, so an assembly whose regulators are
/// added later is picked up on the next request.
#[tracing::instrument(skip(state))]
pub async fn handle(
    state: FeatureState,
    query: ListRegulatorsQuery,
) -> Result<ListRegulatorsResponse, CatalogError> {
    let cache_key = keys::regulators(&query.assembly);
    if let Some(cached) = state.store.get(&cache_key).await? {
        return Ok(serde_json::from_str(&cached)?);
    }

    let regulators = state.catalog.regulators(&query.assembly).await?;
    if !regulators.is_empty() {
        let encoded = serde_json::to_string(&regulators)?;
        state
            .store
            .set_ex(&cache_key, &encoded, state.config.cache.regulators_ttl())
            .await?;
        tracing::debug!(count = regulators.len(), "Regulators cached");
    }

    Ok(regulators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::test_state;

    fn hg19() -> ListRegulatorsQuery {
        ListRegulatorsQuery {
            assembly: "hg19".to_string(),
        }
    }

    #[tokio::test]
    async fn test_listing_is_cached() {
        let t = test_state();
        let regulators = handle(t.state.clone(), hg19()).await.unwrap();
        assert!(regulators.contains_key("PARCLIP_scifi"));
        assert!(t.store.ttl("regulators:hg19").await.unwrap().is_some());

        // Served from the cache once the files are gone
        std::fs::remove_dir_all(t.data_dir.path().join("regulators")).unwrap();
        assert_eq!(handle(t.state.clone(), hg19()).await.unwrap(), regulators);
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_cached() {
        let t = test_state();
        let regulators = handle(
            t.state.clone(),
            ListRegulatorsQuery {
                assembly: "mm10".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(regulators.is_empty());
        assert!(!t.store.exists("regulators:mm10").await.unwrap());
    }
}
