use mediator::Request;
use serde::{Deserialize, Serialize};
use vistela_common::types::MAX_VIDEO_ID_LEN;

use crate::db::{SharedVideoStore, StoreError, VideoRecord};
use crate::features::shared::validation::{validate_required_text, FieldValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetVideoQuery {
    pub video_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetVideoError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Request<Result<VideoRecord, GetVideoError>> for GetVideoQuery {}

impl crate::cqrs::middleware::Query for GetVideoQuery {}

impl GetVideoQuery {
    pub fn validate(&self) -> Result<(), GetVideoError> {
        validate_required_text("video_id", &self.video_id, MAX_VIDEO_ID_LEN)?;
        Ok(())
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(store: SharedVideoStore, query: GetVideoQuery) -> Result<VideoRecord, GetVideoError> {
    query.validate()?;
    Ok(store.get(&query.video_id).await?)
}
