//! Shared harness for HTTP-level tests
//!
//! Builds the full router over a [`MemoryStore`] with a scripted analysis
//! engine, a small data tree, and an empty session store. Queued jobs are
//! run explicitly with [`TestApp::run_jobs`], so every test decides when
//! workers get to act.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dorina_common::types::ResultRow;
use dorina_server::{
    api,
    config::Config,
    engine::{AnalysisEngine, AnalysisRequest, EngineError},
    features::FeatureState,
    jobs::{JobQueue, PoolConfig, WorkerContext, WorkerPool},
    store::{MemoryStore, SharedStore},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};
use tempfile::TempDir;
use tower::ServiceExt;

/// Engine returning canned rows, or failing with a canned message
pub struct FakeEngine {
    rows: Mutex<Result<Vec<ResultRow>, String>>,
    pub requests: Mutex<Vec<AnalysisRequest>>,
}

impl FakeEngine {
    pub fn returning(rows: Vec<ResultRow>) -> Self {
        Self {
            rows: Mutex::new(Ok(rows)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            rows: Mutex::new(Err(message.to_string())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl AnalysisEngine for FakeEngine {
    async fn analyse(
        &self,
        _datadir: &Path,
        request: &AnalysisRequest,
    ) -> Result<Vec<ResultRow>, EngineError> {
        self.requests.lock().unwrap().push(request.clone());
        self.rows.lock().unwrap().clone().map_err(|stderr| EngineError::Failed {
            status: "exit status: 2".to_string(),
            stderr,
        })
    }
}

pub fn hit(gene: &str, score: f64) -> ResultRow {
    ResultRow {
        data_source: "PARCLIP".to_string(),
        score,
        track: "PUM2".to_string(),
        gene: gene.to_string(),
        site: "PUM2_kidney".to_string(),
        strand: "+".to_string(),
        location: "chr1:1000-1020".to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: SharedStore,
    pub config: Arc<Config>,
    pub engine: Arc<FakeEngine>,
    pool: WorkerPool,
    pub data_dir: TempDir,
    pub session_dir: TempDir,
}

fn write_data_tree(root: &Path) {
    let assembly = root.join("genomes/h_sapiens/hg19");
    std::fs::create_dir_all(assembly.join("kidney")).unwrap();
    std::fs::write(
        root.join("genomes/h_sapiens/genome.json"),
        r#"{"id":"h_sapiens","label":"Human","scientific":"Homo sapiens","weight":10,"assemblies":{"hg19":{}}}"#,
    )
    .unwrap();
    std::fs::write(
        assembly.join("all.gff"),
        "chr1\tdoRiNA2\tgene\t1\t5000\t.\t+\t.\tID=gene01.01\n\
         chr1\tdoRiNA2\tgene\t6001\t9000\t.\t+\t.\tID=gene01.02\n\
         chr2\tdoRiNA2\tgene\t1\t5000\t.\t-\t.\tID=gene01.03\n",
    )
    .unwrap();

    let regulators = root.join("regulators/h_sapiens/hg19");
    std::fs::create_dir_all(&regulators).unwrap();
    std::fs::write(
        regulators.join("PARCLIP_PUM2.json"),
        r#"{"id":"PARCLIP_PUM2","experiment":"PARCLIP"}"#,
    )
    .unwrap();
    std::fs::write(regulators.join("PARCLIP_PUM2.bed"), "chr1\t1000\t1020\tPUM2\t5\t+\n").unwrap();
}

impl TestApp {
    pub fn new(engine: FakeEngine) -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let session_dir = tempfile::tempdir().unwrap();
        write_data_tree(data_dir.path());

        let mut config = Config::default();
        config.paths.data_path = data_dir.path().to_path_buf();
        config.paths.session_store = session_dir.path().to_path_buf();
        let config = Arc::new(config);

        let store: SharedStore = Arc::new(MemoryStore::new());
        let engine = Arc::new(engine);

        let pool = WorkerPool::new(
            JobQueue::new(store.clone()),
            WorkerContext::from_config(store.clone(), engine.clone(), &config),
            PoolConfig {
                concurrency: 1,
                job_timeout: Duration::from_secs(10),
                poll_interval: Duration::from_millis(10),
            },
        );

        let router = api::create_router(FeatureState::new(store.clone(), config.clone()), &config);

        Self {
            router,
            store,
            config,
            engine,
            pool,
            data_dir,
            session_dir,
        }
    }

    /// Run every queued job to completion; returns how many ran
    pub async fn run_jobs(&self) -> usize {
        self.pool.drain().await
    }

    pub async fn queued(&self) -> usize {
        JobQueue::new(self.store.clone()).len().await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn get_json(&self, uri: &str) -> Value {
        let (status, body) = self.get(uri).await;
        assert_eq!(status, StatusCode::OK, "GET {}", uri);
        serde_json::from_slice(&body).unwrap()
    }

    /// POST a search form; `fields` are sent in the given order
    pub async fn search(&self, fields: &[(&str, &str)]) -> (StatusCode, Value) {
        let body: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1.0/search")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, body)
    }
}
