use dorina_common::types::ResultRow;
use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::{
    features::{shared::OffsetPage, FeatureState},
    jobs::results::decode_rows,
    session::SessionState,
    store::{keys, StoreError},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResultPageQuery {
    pub uuid: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageState {
    Done,
    Pending,
    Expired,
    Error,
}

/// One page of a result list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub state: PageState,
    pub results: Vec<ResultRow>,
    pub more_results: bool,
    pub next_offset: usize,
    pub total_results: usize,
}

impl ResultPage {
    /// Reported when the list holds a failed-job row
    pub fn failed() -> Self {
        Self {
            state: PageState::Error,
            results: Vec::new(),
            more_results: false,
            next_offset: 0,
            total_results: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GetResultPageResponse {
    Page(ResultPage),
    /// No list to read yet (`pending`) or any more (`expired`)
    Unavailable { uuid: String, state: PageState },
}

#[derive(Debug, thiserror::Error)]
pub enum GetResultPageError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Corrupt result row: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Request<Result<GetResultPageResponse, GetResultPageError>> for GetResultPageQuery {}

impl crate::cqrs::middleware::Query for GetResultPageQuery {}

#[tracing::instrument(skip(state), fields(uuid = %query.uuid, offset = query.offset))]
pub async fn handle(
    state: FeatureState,
    query: GetResultPageQuery,
) -> Result<GetResultPageResponse, GetResultPageError> {
    let unavailable = |page_state| GetResultPageResponse::Unavailable {
        uuid: query.uuid.clone(),
        state: page_state,
    };

    let Some(result_key) = state.sessions.resolve(&query.uuid).await? else {
        return Ok(unavailable(PageState::Expired));
    };

    // Workers push in batches and clear the marker last, so a list with a
    // marker still held may be partial
    if state.store.exists(&keys::pending(&result_key)).await? {
        return Ok(unavailable(PageState::Pending));
    }

    // Reading a list keeps it alive
    if !state.store.expire(&result_key, state.config.cache.result_ttl()).await? {
        let waiting =
            state.sessions.get_status(&query.uuid).await?.state == SessionState::Pending;
        return Ok(unavailable(if waiting {
            PageState::Pending
        } else {
            PageState::Expired
        }));
    }

    let first = decode_rows(&state.store.lrange(&result_key, 0, 0).await?)?;
    if first.first().is_some_and(ResultRow::is_job_failure) {
        tracing::error!(data_source = %first[0].data_source, "Reporting failed job");
        return Ok(GetResultPageResponse::Page(ResultPage::failed()));
    }

    let page = OffsetPage::new(query.offset, state.config.cache.max_results);
    let (start, stop) = page.range();
    let total = state.store.llen(&result_key).await?;
    let results = decode_rows(&state.store.lrange(&result_key, start, stop).await?)?;

    Ok(GetResultPageResponse::Page(ResultPage {
        state: PageState::Done,
        results,
        more_results: page.has_more(total),
        next_offset: page.next_offset(),
        total_results: total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::test_state;

    fn row(gene: &str, score: f64) -> String {
        serde_json::to_string(&ResultRow {
            data_source: "PARCLIP".to_string(),
            score,
            track: "scifi".to_string(),
            gene: gene.to_string(),
            site: "scifi_cds".to_string(),
            strand: "+".to_string(),
            location: "chr1:250-260".to_string(),
        })
        .unwrap()
    }

    async fn page(state: &FeatureState, uuid: &str, offset: usize) -> GetResultPageResponse {
        handle(
            state.clone(),
            GetResultPageQuery {
                uuid: uuid.to_string(),
                offset,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_small_list_fits_one_page() {
        let t = test_state();
        let rows = vec![row("gene01.01", 7.0), row("gene01.02", 5.0), row("gene01.03", 2.0)];
        t.store.rpush("results:q", &rows).await.unwrap();
        t.state.sessions.point_to("s1", "results:q").await.unwrap();

        let GetResultPageResponse::Page(result) = page(&t.state, "s1", 0).await else {
            panic!("expected a page");
        };
        assert_eq!(result.state, PageState::Done);
        assert_eq!(result.results.len(), 3);
        assert_eq!(result.results[0].gene, "gene01.01");
        assert!(!result.more_results);
        assert_eq!(result.next_offset, 100);
        assert_eq!(result.total_results, 3);
        assert!(t.store.ttl("results:q").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_offset_paging() {
        let t = test_state();
        let rows: Vec<String> = (0..250).map(|i| row(&format!("g{}", i), 1.0)).collect();
        t.store.rpush("results:q", &rows).await.unwrap();
        t.state.sessions.point_to("s1", "results:q").await.unwrap();

        let GetResultPageResponse::Page(result) = page(&t.state, "s1", 100).await else {
            panic!("expected a page");
        };
        assert_eq!(result.results.len(), 100);
        assert_eq!(result.results[0].gene, "g100");
        assert!(result.more_results);
        assert_eq!(result.next_offset, 200);

        let GetResultPageResponse::Page(result) = page(&t.state, "s1", 200).await else {
            panic!("expected a page");
        };
        assert_eq!(result.results.len(), 50);
        assert!(!result.more_results);
        assert_eq!(result.total_results, 250);
    }

    #[tokio::test]
    async fn test_failed_job_reports_error() {
        let t = test_state();
        let failed = serde_json::to_string(&ResultRow::job_failed("boom")).unwrap();
        t.store.rpush("results:q", &[failed]).await.unwrap();
        t.state.sessions.point_to("s1", "results:q").await.unwrap();

        assert_eq!(
            page(&t.state, "s1", 0).await,
            GetResultPageResponse::Page(ResultPage::failed())
        );
    }

    #[tokio::test]
    async fn test_missing_pointer_is_expired() {
        let t = test_state();
        let json = serde_json::to_value(page(&t.state, "s1", 0).await).unwrap();
        assert_eq!(json, serde_json::json!({"uuid": "s1", "state": "expired"}));
    }

    #[tokio::test]
    async fn test_partly_written_list_is_pending() {
        let t = test_state();
        t.state.sessions.point_to("s1", "results:q").await.unwrap();
        t.store
            .set_ex("results:q_pending", "1", std::time::Duration::from_secs(30))
            .await
            .unwrap();
        t.store
            .rpush("results:q", &[row("gene01.01", 7.0), row("gene01.02", 5.0)])
            .await
            .unwrap();

        let json = serde_json::to_value(page(&t.state, "s1", 0).await).unwrap();
        assert_eq!(json, serde_json::json!({"uuid": "s1", "state": "pending"}));

        t.store.delete("results:q_pending").await.unwrap();
        let GetResultPageResponse::Page(result) = page(&t.state, "s1", 0).await else {
            panic!("expected a page");
        };
        assert_eq!(result.total_results, 2);
    }

    #[tokio::test]
    async fn test_huge_offset_is_an_empty_page() {
        let t = test_state();
        t.store.rpush("results:q", &[row("gene01.01", 7.0)]).await.unwrap();
        t.state.sessions.point_to("s1", "results:q").await.unwrap();

        let GetResultPageResponse::Page(result) = page(&t.state, "s1", usize::MAX).await else {
            panic!("expected a page");
        };
        assert!(result.results.is_empty());
        assert!(!result.more_results);
        assert_eq!(result.next_offset, usize::MAX);
        assert_eq!(result.total_results, 1);
    }

    #[tokio::test]
    async fn test_list_not_written_yet_is_pending() {
        let t = test_state();
        t.state.sessions.point_to("s1", "results:q").await.unwrap();
        t.store
            .set_ex("results:q_pending", "1", std::time::Duration::from_secs(30))
            .await
            .unwrap();

        let json = serde_json::to_value(page(&t.state, "s1", 0).await).unwrap();
        assert_eq!(json["state"], "pending");

        t.store.delete("results:q_pending").await.unwrap();
        let json = serde_json::to_value(page(&t.state, "s1", 0).await).unwrap();
        assert_eq!(json["state"], "expired");
    }
}
