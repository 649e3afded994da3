//! Search API routes
//!
//! - `POST /search` - validate a search form and dispatch its job

use crate::{api::response::ErrorResponse, features::FeatureState, query};
use axum::{
    extract::{RawForm, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::commands::{DispatchSearchCommand, DispatchSearchError};

pub fn search_routes() -> Router<FeatureState> {
    Router::new().route("/search", post(search))
}

/// Dispatch a search
///
/// # Request Body
///
/// `application/x-www-form-urlencoded` with `assembly`, `set_a[]`, and
/// optionally `genes[]`, `set_b[]`, `match_a`, `match_b`, `region_a`,
/// `region_b`, `combinatorial_op`, `window_a`, `window_b`, `tissue`, `uuid`.
///
/// # Response
///
/// - `200 OK` - `{"state": "done"|"pending", "uuid": "..."}`
/// - `400 Bad Request` - invalid form, nothing queued
/// - `500 Internal Server Error` - store error
#[tracing::instrument(skip(state, body))]
async fn search(
    State(state): State<FeatureState>,
    RawForm(body): RawForm,
) -> Result<Response, SearchApiError> {
    let form = query::SearchForm::from_urlencoded(&body);
    let canonical = query::canonicalize(&form).map_err(DispatchSearchError::from)?;

    let command = DispatchSearchCommand {
        canonical,
        uuid: form.uuid,
    };
    let response = super::commands::dispatch::handle(state, command).await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[derive(Debug)]
struct SearchApiError(DispatchSearchError);

impl From<DispatchSearchError> for SearchApiError {
    fn from(err: DispatchSearchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SearchApiError {
    fn into_response(self) -> Response {
        match self.0 {
            DispatchSearchError::Validation(ref e) => {
                tracing::debug!(error = %e, "Rejected search");
                let error = ErrorResponse::new("VALIDATION_ERROR", e.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            DispatchSearchError::Store(_)
            | DispatchSearchError::Queue(_)
            | DispatchSearchError::Session(_) => {
                tracing::error!("Failed to dispatch search: {}", self.0);
                let error = ErrorResponse::new("STORE_ERROR", "A store error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}
