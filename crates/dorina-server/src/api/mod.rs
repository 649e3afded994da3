pub mod response;

use crate::{config::Config, error::ServerResult, features, middleware};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::compression::CompressionLayer;

/// Path prefix browser clients use for every API call
pub const API_PREFIX: &str = "/api/v1.0";

/// Create the application router with all routes and middleware
pub fn create_router(state: features::FeatureState, config: &Config) -> Router {
    let base = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state.clone());

    base.nest(API_PREFIX, features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "doRiNA Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Health check handler
async fn health(State(state): State<features::FeatureState>) -> ServerResult<Response> {
    state.store.ping().await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "store": "connected"
        })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{body_json, get, send, test_state};

    #[tokio::test]
    async fn test_health_and_prefix() {
        let t = test_state();
        let config = t.state.config.clone();
        let app = create_router(t.state.clone(), &config);

        let response = send(app.clone(), get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["store"], "connected");

        let response = send(app.clone(), get("/api/v1.0/status/none")).await;
        assert_eq!(body_json(response).await["state"], "expired");

        let response = send(app, get("/status/none")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
