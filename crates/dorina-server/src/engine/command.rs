//! External-process engine
//!
//! The configured command is started with `--datadir <path>` appended and
//! the JSON-encoded [`AnalysisRequest`] on stdin. Its stdout is either a JSON
//! array of result rows or tab-delimited lines, one hit per line.

use async_trait::async_trait;
use dorina_common::types::ResultRow;
use std::{path::Path, process::Stdio};
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::debug;

use super::{AnalysisEngine, AnalysisRequest, EngineError};

/// Longest stderr excerpt kept in an error message
const STDERR_EXCERPT: usize = 2_000;

#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line into program and arguments
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl AnalysisEngine for CommandEngine {
    #[tracing::instrument(skip(self, request), fields(program = %self.program, genome = %request.genome))]
    async fn analyse(
        &self,
        datadir: &Path,
        request: &AnalysisRequest,
    ) -> Result<Vec<ResultRow>, EngineError> {
        let payload = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--datadir")
            .arg(datadir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let rows = parse_engine_output(&stdout)?;
        debug!(rows = rows.len(), "Analysis engine finished");
        Ok(rows)
    }
}

/// Decode engine stdout in either supported shape
pub fn parse_engine_output(stdout: &str) -> Result<Vec<ResultRow>, EngineError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| EngineError::Output(e.to_string()));
    }

    trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| ResultRow::from_tab_line(line).map_err(|e| EngineError::Output(e.to_string())))
        .collect()
}
