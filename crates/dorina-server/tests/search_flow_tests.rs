//! End-to-end search flows: dispatch, workers, status polling, and paging
//!
//! Every request goes through the full router; jobs run on a worker pool
//! over the same in-memory store.

use axum::http::StatusCode;
use dorina_common::types::ResultRow;
use serde_json::{json, Value};

mod helpers;

use helpers::{hit, FakeEngine, TestApp};

const PUM2: &[(&str, &str)] = &[("assembly", "hg19"), ("set_a[]", "PUM2")];

fn uuid_of(response: &Value) -> String {
    response["uuid"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_search_then_poll_then_page() {
    let app = TestApp::new(FakeEngine::returning(vec![
        hit("gene01.01", 5.0),
        hit("gene01.02", 2.0),
        hit("gene01.03", 7.0),
    ]));

    let (status, response) = app.search(PUM2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["state"], "pending");
    let uuid = uuid_of(&response);

    let status = app.get_json(&format!("/api/v1.0/status/{}", uuid)).await;
    assert_eq!(status["state"], "pending");
    let page = app.get_json(&format!("/api/v1.0/result/{}", uuid)).await;
    assert_eq!(page["state"], "pending");

    assert_eq!(app.run_jobs().await, 1);

    let status = app.get_json(&format!("/api/v1.0/status/{}", uuid)).await;
    assert_eq!(status["state"], "done");
    let ttl = status["ttl"].as_u64().unwrap();
    assert!(ttl > 0 && ttl <= app.config.cache.session_ttl_secs);

    let page = app.get_json(&format!("/api/v1.0/result/{}", uuid)).await;
    assert_eq!(page["state"], "done");
    assert_eq!(page["more_results"], false);
    assert_eq!(page["next_offset"], 100);
    assert_eq!(page["total_results"], 3);
    let scores: Vec<f64> = page["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["score"].as_f64().unwrap())
        .collect();
    assert_eq!(scores, vec![7.0, 5.0, 2.0]);
}

#[tokio::test]
async fn test_cached_search_is_not_recomputed() {
    let app = TestApp::new(FakeEngine::returning(vec![hit("gene01.01", 1.0)]));

    app.search(PUM2).await;
    app.run_jobs().await;

    for _ in 0..2 {
        let (_, response) = app.search(PUM2).await;
        assert_eq!(response["state"], "done");
    }
    assert_eq!(app.queued().await, 0);
    assert_eq!(app.engine.calls(), 1);
}

#[tokio::test]
async fn test_field_order_does_not_change_the_cache_key() {
    let app = TestApp::new(FakeEngine::returning(vec![hit("gene01.01", 1.0)]));

    app.search(&[
        ("assembly", "hg19"),
        ("set_a[]", "PUM2"),
        ("match_a", "any"),
        ("set_b[]", ""),
    ])
    .await;
    app.run_jobs().await;

    let (_, response) = app
        .search(&[("match_a", "any"), ("set_a[]", "PUM2"), ("assembly", "hg19")])
        .await;
    assert_eq!(response["state"], "done");
}

#[tokio::test]
async fn test_waiting_sessions_share_one_job() {
    let app = TestApp::new(FakeEngine::returning(vec![hit("gene01.01", 1.0)]));

    let (_, first) = app.search(PUM2).await;
    let (_, second) = app.search(PUM2).await;
    assert_eq!(app.queued().await, 1);

    app.run_jobs().await;

    for response in [first, second] {
        let uuid = uuid_of(&response);
        let status = app.get_json(&format!("/api/v1.0/status/{}", uuid)).await;
        assert_eq!(status["state"], "done");
        let page = app.get_json(&format!("/api/v1.0/result/{}", uuid)).await;
        assert_eq!(page["total_results"], 1);
    }
    assert_eq!(app.engine.calls(), 1);
}

#[tokio::test]
async fn test_empty_engine_output_stores_no_results_row() {
    let app = TestApp::new(FakeEngine::returning(Vec::new()));

    let (_, response) = app.search(PUM2).await;
    app.run_jobs().await;

    let page = app
        .get_json(&format!("/api/v1.0/result/{}", uuid_of(&response)))
        .await;
    assert_eq!(page["state"], "done");
    assert_eq!(page["total_results"], 1);
    let row: ResultRow = serde_json::from_value(page["results"][0].clone()).unwrap();
    assert!(row.is_no_results());
}

#[tokio::test]
async fn test_engine_failure_is_reported_as_error() {
    let app = TestApp::new(FakeEngine::failing("regulator file missing"));

    let (_, response) = app.search(PUM2).await;
    app.run_jobs().await;

    let page = app
        .get_json(&format!("/api/v1.0/result/{}", uuid_of(&response)))
        .await;
    assert_eq!(
        page,
        json!({
            "state": "error",
            "results": [],
            "more_results": false,
            "next_offset": 0,
            "total_results": 0
        })
    );
}

#[tokio::test]
async fn test_gene_filter_uses_cached_full_result() {
    let app = TestApp::new(FakeEngine::returning(vec![
        hit("gene01.01", 3.0),
        hit("gene01.02", 2.0),
        hit("gene01.03", 1.0),
    ]));

    app.search(PUM2).await;
    app.run_jobs().await;

    let (_, response) = app
        .search(&[
            ("assembly", "hg19"),
            ("set_a[]", "PUM2"),
            ("genes[]", "gene01.01"),
            ("genes[]", "gene01.02"),
        ])
        .await;
    assert_eq!(response["state"], "pending");
    app.run_jobs().await;

    // The filter ran over the cached list; the engine was not called again
    assert_eq!(app.engine.calls(), 1);

    let page = app
        .get_json(&format!("/api/v1.0/result/{}", uuid_of(&response)))
        .await;
    let genes: Vec<&str> = page["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["gene"].as_str().unwrap())
        .collect();
    assert_eq!(genes, vec!["gene01.01", "gene01.02"]);
}

#[tokio::test]
async fn test_custom_regulator_is_resolved_for_the_engine() {
    let app = TestApp::new(FakeEngine::returning(vec![hit("gene01.01", 1.0)]));

    let (_, session) = app.get("/api/v1.0/go").await;
    let session: Value = serde_json::from_slice(&session).unwrap();
    let uuid = uuid_of(&session);

    app.search(&[("assembly", "hg19"), ("set_a[]", &uuid), ("uuid", &uuid)])
        .await;
    app.run_jobs().await;

    let requests = app.engine.requests.lock().unwrap();
    let expected = app
        .session_dir
        .path()
        .join(format!("dorina-{}", uuid))
        .join(format!("{}.bed", uuid));
    assert_eq!(requests[0].set_a, vec![expected.to_string_lossy().to_string()]);
}

#[tokio::test]
async fn test_invalid_search_queues_nothing() {
    let app = TestApp::new(FakeEngine::returning(Vec::new()));

    for fields in [
        &[("set_a[]", "PUM2")][..],
        &[("assembly", "hg19")][..],
        &[("assembly", "hg19"), ("set_a[]", "PUM2"), ("match_a", "some")][..],
        &[("assembly", "hg19"), ("set_a[]", "PUM2"), ("combinatorial_op", "nand")][..],
    ] {
        let (status, response) = app.search(fields).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"]["code"], "VALIDATION_ERROR");
    }
    assert_eq!(app.queued().await, 0);
}

#[tokio::test]
async fn test_unknown_session_is_expired() {
    let app = TestApp::new(FakeEngine::returning(Vec::new()));

    let status = app.get_json("/api/v1.0/status/5d0e7c5e").await;
    assert_eq!(status, json!({"uuid": "5d0e7c5e", "state": "expired"}));

    let page = app.get_json("/api/v1.0/result/5d0e7c5e").await;
    assert_eq!(page, json!({"uuid": "5d0e7c5e", "state": "expired"}));

    let (status, _) = app.get("/api/v1.0/download/results/5d0e7c5e").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_after_search() {
    let app = TestApp::new(FakeEngine::returning(vec![hit("gene01.01", 4.0)]));

    let (_, response) = app.search(PUM2).await;
    app.run_jobs().await;
    let uuid = uuid_of(&response);

    let (status, body) = app
        .get(&format!("/api/v1.0/download/results/{}?format=bed", uuid))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "chr1\t1000\t1020\tPARCLIP#PUM2*PUM2_kidney\t4\t+\n"
    );

    let (status, body) = app
        .get(&format!("/api/v1.0/download/results/{}", uuid))
        .await;
    assert_eq!(status, StatusCode::OK);
    let line = String::from_utf8(body).unwrap();
    let row: ResultRow = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(row, hit("gene01.01", 4.0));
}
