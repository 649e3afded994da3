//! In-memory feature state for route and handler tests

use axum::{body::Body, http::Request, response::Response, Router};
use http_body_util::BodyExt;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{
    catalog::fixtures,
    config::Config,
    features::FeatureState,
    store::{MemoryStore, SharedStore},
};

/// Feature state over a [`MemoryStore`], with a populated data tree and an
/// empty session store in temporary directories
pub struct TestState {
    pub state: FeatureState,
    pub store: SharedStore,
    pub data_dir: TempDir,
    pub session_dir: TempDir,
}

pub fn test_state() -> TestState {
    let data_dir = tempfile::tempdir().unwrap();
    let session_dir = tempfile::tempdir().unwrap();
    fixtures::write_data_tree(data_dir.path());

    let mut config = Config::default();
    config.paths.data_path = data_dir.path().to_path_buf();
    config.paths.session_store = session_dir.path().to_path_buf();

    let store: SharedStore = Arc::new(MemoryStore::new());
    let state = FeatureState::new(store.clone(), Arc::new(config));

    TestState {
        state,
        store,
        data_dir,
        session_dir,
    }
}

/// Send one request through a router
pub async fn send(router: Router, request: Request<Body>) -> Response {
    router.oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
