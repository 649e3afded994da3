//! Server-level routes: health, catalog lookups, and session creation

use axum::http::StatusCode;
use serde_json::json;

mod helpers;

use helpers::{FakeEngine, TestApp};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new(FakeEngine::returning(Vec::new()));
    let health = app.get_json("/health").await;
    assert_eq!(health, json!({"status": "healthy", "store": "connected"}));
}

#[tokio::test]
async fn test_root_reports_version() {
    let app = TestApp::new(FakeEngine::returning(Vec::new()));
    let root = app.get_json("/").await;
    assert_eq!(root["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_catalog_lookups() {
    let app = TestApp::new(FakeEngine::returning(Vec::new()));

    let genomes = app.get_json("/api/v1.0/genomes").await;
    assert_eq!(genomes["genomes"][0]["id"], "h_sapiens");

    let assemblies = app.get_json("/api/v1.0/assemblies/h_sapiens").await;
    assert_eq!(assemblies["assemblies"][0]["id"], "hg19");
    assert_eq!(assemblies["assemblies"][0]["weight"], 19);

    let regulators = app.get_json("/api/v1.0/regulators/hg19").await;
    assert_eq!(regulators["PARCLIP_PUM2"]["experiment"], "PARCLIP");

    let genes = app.get_json("/api/v1.0/genes/hg19/gene01.0").await;
    assert_eq!(genes, json!({"genes": ["gene01.01", "gene01.02", "gene01.03"]}));

    let tissues = app.get_json("/api/v1.0/tissues/hg19").await;
    assert_eq!(tissues, json!({"tissue": ["kidney"]}));

    let (status, body) = app.get("/api/v1.0/download/regulator/hg19/PARCLIP_PUM2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"chr1\t1000\t1020\tPUM2\t5\t+\n".to_vec());

    let (status, _) = app.get("/api/v1.0/download/regulator/hg19/..").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_go_creates_fresh_sessions() {
    let app = TestApp::new(FakeEngine::returning(Vec::new()));

    let first = app.get_json("/api/v1.0/go").await;
    let second = app.get_json("/api/v1.0/go").await;
    assert_ne!(first["uuid"], second["uuid"]);

    let status = app
        .get_json(&format!("/api/v1.0/status/{}", first["uuid"].as_str().unwrap()))
        .await;
    assert_eq!(status["state"], "initialised");
}
