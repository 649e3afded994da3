//! Analysis engine seam
//!
//! The overlap computation itself lives outside this crate. Workers talk to
//! it through [`AnalysisEngine`]; the production implementation is
//! [`CommandEngine`], which runs an external executable.

use async_trait::async_trait;
use dorina_common::types::ResultRow;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::query::{Combine, MatchMode, Query};

mod command;

pub use command::{parse_engine_output, CommandEngine};

/// Failures raised by an engine run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to start analysis engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis engine IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Analysis engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Unreadable analysis engine output: {0}")]
    Output(String),

    #[error("Invalid analysis request: {0}")]
    Request(#[from] serde_json::Error),
}

/// Arguments handed to the engine for one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub genome: String,
    pub match_a: MatchMode,
    pub region_a: String,
    pub set_a: Vec<String>,
    pub match_b: MatchMode,
    pub region_b: String,
    pub set_b: Option<Vec<String>>,
    pub combine: Combine,
    pub genes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_a: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_b: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tissue: Option<String>,
}

impl From<&Query> for AnalysisRequest {
    fn from(query: &Query) -> Self {
        Self {
            genome: query.genome.clone(),
            match_a: query.match_a,
            region_a: query.region_a.clone(),
            set_a: query.set_a.clone(),
            match_b: query.match_b,
            region_b: query.region_b.clone(),
            set_b: query.set_b.clone(),
            combine: query.combine,
            genes: query.genes.to_vec(),
            window_a: query.window_a,
            window_b: query.window_b,
            tissue: query.tissue.clone(),
        }
    }
}

#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Run one analysis against the data under `datadir`
    async fn analyse(
        &self,
        datadir: &Path,
        request: &AnalysisRequest,
    ) -> Result<Vec<ResultRow>, EngineError>;
}
