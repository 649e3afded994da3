//! Result API routes
//!
//! - `GET /result/:uuid` - first page (or `?offset=N`)
//! - `GET /result/:uuid/:offset` - page starting at `offset`
//! - `GET /download/results/:uuid?format=raw|bed` - the whole list as a file

use crate::{
    api::response::ErrorResponse,
    features::{shared::OffsetParams, FeatureState},
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::queries::{
    DownloadFormat, DownloadResultsError, DownloadResultsQuery, GetResultPageError,
    GetResultPageQuery,
};

pub fn results_routes() -> Router<FeatureState> {
    Router::new()
        .route("/result/:uuid", get(get_result))
        .route("/result/:uuid/:offset", get(get_result_at))
        .route("/download/results/:uuid", get(download_results))
}

#[derive(Debug, Deserialize)]
struct DownloadParams {
    #[serde(default)]
    format: DownloadFormat,
}

#[tracing::instrument(skip(state), fields(uuid = %uuid))]
async fn get_result(
    State(state): State<FeatureState>,
    Path(uuid): Path<String>,
    Query(params): Query<OffsetParams>,
) -> Result<Response, ResultApiError> {
    page(state, uuid, params.offset()).await
}

#[tracing::instrument(skip(state), fields(uuid = %uuid, offset = offset))]
async fn get_result_at(
    State(state): State<FeatureState>,
    Path((uuid, offset)): Path<(String, usize)>,
) -> Result<Response, ResultApiError> {
    page(state, uuid, offset).await
}

async fn page(state: FeatureState, uuid: String, offset: usize) -> Result<Response, ResultApiError> {
    let response =
        super::queries::get_page::handle(state, GetResultPageQuery { uuid, offset }).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

#[tracing::instrument(skip(state), fields(uuid = %uuid))]
async fn download_results(
    State(state): State<FeatureState>,
    Path(uuid): Path<String>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ResultApiError> {
    let query = DownloadResultsQuery {
        uuid,
        format: params.format,
    };
    let response = super::queries::download::handle(state, query).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", response.filename),
            ),
        ],
        response.body,
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
enum ResultApiError {
    #[error(transparent)]
    Page(#[from] GetResultPageError),
    #[error(transparent)]
    Download(#[from] DownloadResultsError),
}

impl IntoResponse for ResultApiError {
    fn into_response(self) -> Response {
        match self {
            ResultApiError::Download(DownloadResultsError::NotFound(_)) => {
                let error = ErrorResponse::new("NOT_FOUND", self.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            _ => {
                tracing::error!("Failed to read results: {}", self);
                let error = ErrorResponse::new("STORE_ERROR", "A store error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{body_bytes, body_json, get, send, test_state};
    use dorina_common::types::ResultRow;

    async fn seed(t: &crate::features::shared::test_helpers::TestState, rows: usize) {
        let encoded: Vec<String> = (0..rows)
            .map(|i| {
                serde_json::to_string(&ResultRow {
                    gene: format!("gene01.{:02}", i),
                    location: "chr1:1-2".to_string(),
                    ..ResultRow::no_results()
                })
                .unwrap()
            })
            .collect();
        t.store.rpush("results:q", &encoded).await.unwrap();
        t.state.sessions.point_to("s1", "results:q").await.unwrap();
    }

    #[tokio::test]
    async fn test_offset_in_path_and_query() {
        let t = test_state();
        seed(&t, 120).await;

        let json = body_json(send(results_routes().with_state(t.state.clone()), get("/result/s1")).await).await;
        assert_eq!(json["results"].as_array().unwrap().len(), 100);
        assert_eq!(json["more_results"], true);

        let json =
            body_json(send(results_routes().with_state(t.state.clone()), get("/result/s1/100")).await)
                .await;
        assert_eq!(json["results"].as_array().unwrap().len(), 20);
        assert_eq!(json["next_offset"], 200);

        let json = body_json(
            send(results_routes().with_state(t.state.clone()), get("/result/s1?offset=110")).await,
        )
        .await;
        assert_eq!(json["results"].as_array().unwrap().len(), 10);
        assert_eq!(json["total_results"], 120);
    }

    #[tokio::test]
    async fn test_largest_offset_is_an_empty_page() {
        let t = test_state();
        seed(&t, 3).await;

        let response = send(
            results_routes().with_state(t.state.clone()),
            get("/result/s1/18446744073709551615"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["results"], serde_json::json!([]));
        assert_eq!(json["more_results"], false);
        assert_eq!(json["total_results"], 3);
    }

    #[tokio::test]
    async fn test_download_headers() {
        let t = test_state();
        seed(&t, 2).await;

        let response = send(
            results_routes().with_state(t.state.clone()),
            get("/download/results/s1?format=bed"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=dorina.bed"
        );
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(body.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_download_unknown_session() {
        let t = test_state();
        let response = send(
            results_routes().with_state(t.state.clone()),
            get("/download/results/nobody"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
