//! Server-wide error type
//!
//! Feature slices map their own error enums to responses. [`AppError`]
//! covers the routes outside any slice.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{api::response::ErrorResponse, store::StoreError};

pub type ServerResult<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                let error = ErrorResponse::with_details(
                    "STORE_UNAVAILABLE",
                    "The key-value store is unavailable",
                    json!({ "reason": e.to_string() }),
                );
                (StatusCode::SERVICE_UNAVAILABLE, Json(error)).into_response()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_unavailable() {
        let response = AppError::Store(StoreError::WrongType("k".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
