//! Session API routes
//!
//! - `GET /go` - start a session
//! - `POST /go` - start a session with an optional custom regulator (`bedfile`)
//! - `GET /status/:uuid` - poll a session's state

use crate::{api::response::ErrorResponse, features::FeatureState, session::SessionError};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::{
    commands::{BedUpload, CreateSessionCommand, CreateSessionError},
    queries::{GetSessionStatusError, GetSessionStatusQuery},
};

/// Multipart field carrying the custom regulator
const BEDFILE_FIELD: &str = "bedfile";

pub fn sessions_routes() -> Router<FeatureState> {
    Router::new()
        .route("/go", get(create_session).post(upload_session))
        .route("/status/:uuid", get(get_status))
}

#[tracing::instrument(skip(state))]
async fn create_session(State(state): State<FeatureState>) -> Result<Response, SessionApiError> {
    let response = super::commands::create::handle(state, CreateSessionCommand::default()).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Start a session and store its custom regulator
///
/// # Response
///
/// - `200 OK` - `{"uuid": "...", "custom_regulator": true|false}`
/// - `400 Bad Request` - not a `.bed` file, or fewer than three columns
#[tracing::instrument(skip(state, multipart))]
async fn upload_session(
    State(state): State<FeatureState>,
    mut multipart: Multipart,
) -> Result<Response, SessionApiError> {
    let mut upload: Option<BedUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SessionApiError::Multipart(e.to_string()))?
    {
        if field.name() != Some(BEDFILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| SessionApiError::Multipart(e.to_string()))?;
        // Browsers send an empty part when no file was picked
        if !filename.is_empty() || !content.is_empty() {
            upload = Some(BedUpload {
                filename,
                content: content.to_vec(),
            });
        }
    }

    let response = super::commands::create::handle(state, CreateSessionCommand { upload }).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

#[tracing::instrument(skip(state), fields(uuid = %uuid))]
async fn get_status(
    State(state): State<FeatureState>,
    Path(uuid): Path<String>,
) -> Result<Response, SessionApiError> {
    let status = super::queries::get_status::handle(state, GetSessionStatusQuery { uuid }).await?;
    Ok((StatusCode::OK, Json(status)).into_response())
}

#[derive(Debug)]
enum SessionApiError {
    Multipart(String),
    Create(CreateSessionError),
    Status(GetSessionStatusError),
}

impl From<CreateSessionError> for SessionApiError {
    fn from(err: CreateSessionError) -> Self {
        Self::Create(err)
    }
}

impl From<GetSessionStatusError> for SessionApiError {
    fn from(err: GetSessionStatusError) -> Self {
        Self::Status(err)
    }
}

impl IntoResponse for SessionApiError {
    fn into_response(self) -> Response {
        match self {
            SessionApiError::Multipart(_)
            | SessionApiError::Create(CreateSessionError::NotBedFile(_))
            | SessionApiError::Create(CreateSessionError::TooFewColumns) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            SessionApiError::Create(CreateSessionError::Io(_))
            | SessionApiError::Create(CreateSessionError::Session(SessionError::UploadDir { .. })) => {
                tracing::error!("IO error while storing upload: {}", self);
                let error = ErrorResponse::new("IO_ERROR", "Failed to store the uploaded file");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            SessionApiError::Create(CreateSessionError::Session(SessionError::Store(_)))
            | SessionApiError::Status(GetSessionStatusError::Store(_)) => {
                tracing::error!("Store error: {}", self);
                let error = ErrorResponse::new("STORE_ERROR", "A store error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for SessionApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Multipart(e) => write!(f, "Invalid upload: {}", e),
            Self::Create(e) => write!(f, "{}", e),
            Self::Status(e) => write!(f, "{}", e),
        }
    }
}
