use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::{features::FeatureState, session::SessionStatus, store::StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSessionStatusQuery {
    pub uuid: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetSessionStatusError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<SessionStatus, GetSessionStatusError>> for GetSessionStatusQuery {}

impl crate::cqrs::middleware::Query for GetSessionStatusQuery {}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: FeatureState,
    query: GetSessionStatusQuery,
) -> Result<SessionStatus, GetSessionStatusError> {
    Ok(state.sessions.get_status(&query.uuid).await?)
}
