use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::{features::FeatureState, session::SessionError};

/// Columns a custom regulator file needs: chrom, start, end
pub const MIN_BED_COLUMNS: usize = 3;

/// A user-supplied regulator file
#[derive(Debug, Clone)]
pub struct BedUpload {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateSessionCommand {
    pub upload: Option<BedUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub uuid: String,
    pub custom_regulator: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateSessionError {
    #[error("Please upload a valid .bed file (got '{0}')")]
    NotBedFile(String),
    #[error("Please upload a valid .bed file with at least three columns.")]
    TooFewColumns,
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Request<Result<CreateSessionResponse, CreateSessionError>> for CreateSessionCommand {}

impl crate::cqrs::middleware::Command for CreateSessionCommand {}

/// Whitespace-separated fields on the first line
fn first_line_columns(content: &[u8]) -> usize {
    String::from_utf8_lossy(content)
        .lines()
        .next()
        .map(|line| line.split_whitespace().count())
        .unwrap_or(0)
}

impl BedUpload {
    pub fn validate(&self) -> Result<(), CreateSessionError> {
        if !self.filename.ends_with(".bed") {
            return Err(CreateSessionError::NotBedFile(self.filename.clone()));
        }
        if first_line_columns(&self.content) < MIN_BED_COLUMNS {
            return Err(CreateSessionError::TooFewColumns);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(state, command), fields(upload = command.upload.is_some()))]
pub async fn handle(
    state: FeatureState,
    command: CreateSessionCommand,
) -> Result<CreateSessionResponse, CreateSessionError> {
    let Some(upload) = command.upload else {
        let uuid = state.sessions.create_session(false).await?;
        return Ok(CreateSessionResponse {
            uuid,
            custom_regulator: false,
        });
    };

    upload.validate()?;

    let uuid = state.sessions.create_session(true).await?;
    let path = state.sessions.custom_regulator_path(&uuid);
    if let Err(e) = tokio::fs::write(&path, &upload.content).await {
        state.sessions.discard(&uuid).await.map_err(SessionError::from)?;
        return Err(e.into());
    }

    tracing::info!(
        session_id = %uuid,
        filename = %upload.filename,
        size = upload.content.len(),
        "Custom regulator stored"
    );

    Ok(CreateSessionResponse {
        uuid,
        custom_regulator: true,
    })
}
