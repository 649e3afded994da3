//! Catalog API routes
//!
//! - `GET /genomes` - every genome, without assembly tables
//! - `GET /assemblies/:genome` - assemblies of one genome
//! - `GET /regulators/:assembly` - regulator metadata keyed by name
//! - `GET /genes/:assembly[/:prefix]` - gene names for autocompletion
//! - `GET /tissues/:assembly` - tissue names
//! - `GET /download/regulator/:assembly/:name` - a regulator's BED file

use crate::{api::response::ErrorResponse, features::FeatureState};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::queries::{
    CatalogError, DownloadRegulatorQuery, ListAssembliesQuery, ListGenesQuery, ListGenomesQuery,
    ListRegulatorsQuery, ListTissuesQuery,
};

pub fn catalog_routes() -> Router<FeatureState> {
    Router::new()
        .route("/genomes", get(list_genomes))
        .route("/assemblies/:genome", get(list_assemblies))
        .route("/regulators/:assembly", get(list_regulators))
        .route("/genes/:assembly", get(list_all_genes))
        .route("/genes/:assembly/:prefix", get(list_genes))
        .route("/tissues/:assembly", get(list_tissues))
        .route("/download/regulator/:assembly/:name", get(download_regulator))
}

#[tracing::instrument(skip(state))]
async fn list_genomes(State(state): State<FeatureState>) -> Result<Response, CatalogApiError> {
    let response = super::queries::list_genomes::handle(state, ListGenomesQuery).await?;
    Ok(Json(response).into_response())
}

#[tracing::instrument(skip(state), fields(genome = %genome))]
async fn list_assemblies(
    State(state): State<FeatureState>,
    Path(genome): Path<String>,
) -> Result<Response, CatalogApiError> {
    let response =
        super::queries::list_assemblies::handle(state, ListAssembliesQuery { genome }).await?;
    Ok(Json(response).into_response())
}

#[tracing::instrument(skip(state), fields(assembly = %assembly))]
async fn list_regulators(
    State(state): State<FeatureState>,
    Path(assembly): Path<String>,
) -> Result<Response, CatalogApiError> {
    let response =
        super::queries::list_regulators::handle(state, ListRegulatorsQuery { assembly }).await?;
    Ok(Json(response).into_response())
}

async fn list_all_genes(
    state: State<FeatureState>,
    Path(assembly): Path<String>,
) -> Result<Response, CatalogApiError> {
    list_genes(state, Path((assembly, String::new()))).await
}

#[tracing::instrument(skip(state), fields(assembly = %assembly, prefix = %prefix))]
async fn list_genes(
    State(state): State<FeatureState>,
    Path((assembly, prefix)): Path<(String, String)>,
) -> Result<Response, CatalogApiError> {
    let response =
        super::queries::list_genes::handle(state, ListGenesQuery { assembly, prefix }).await?;
    Ok(Json(response).into_response())
}

#[tracing::instrument(skip(state), fields(assembly = %assembly))]
async fn list_tissues(
    State(state): State<FeatureState>,
    Path(assembly): Path<String>,
) -> Result<Response, CatalogApiError> {
    let response =
        super::queries::list_tissues::handle(state, ListTissuesQuery { assembly }).await?;
    Ok(Json(response).into_response())
}

#[tracing::instrument(skip(state), fields(assembly = %assembly, name = %name))]
async fn download_regulator(
    State(state): State<FeatureState>,
    Path((assembly, name)): Path<(String, String)>,
) -> Result<Response, CatalogApiError> {
    let response =
        super::queries::download_regulator::handle(state, DownloadRegulatorQuery { assembly, name })
            .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", response.filename),
            ),
        ],
        response.content,
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct CatalogApiError(#[from] CatalogError);

impl IntoResponse for CatalogApiError {
    fn into_response(self) -> Response {
        match self.0 {
            CatalogError::NotFound(_) | CatalogError::InvalidName(_) => {
                let error = ErrorResponse::new("NOT_FOUND", self.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            CatalogError::Data(_) | CatalogError::Serialization(_) => {
                tracing::error!("Catalog error: {}", self);
                let error = ErrorResponse::new("CATALOG_ERROR", "Failed to read the data directory");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            CatalogError::Store(_) => {
                tracing::error!("Store error: {}", self);
                let error = ErrorResponse::new("STORE_ERROR", "A store error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}
