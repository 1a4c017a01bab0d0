//! Move a video to another lifecycle status
//!
//! Any known status may follow any other; the pipeline decides which moves
//! make sense. `updated_at` is refreshed on every call, including a
//! same-status write.

use mediator::Request;
use serde::{Deserialize, Serialize};
use vistela_common::{types::MAX_VIDEO_ID_LEN, UnknownStatusError, VideoStatus};

use crate::db::{SharedVideoStore, StoreError, VideoRecord};
use crate::features::shared::validation::{validate_required_text, FieldValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVideoStatusCommand {
    /// Taken from the path, never the body
    #[serde(skip)]
    pub video_id: String,
    /// Status label, parsed during validation
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateVideoStatusError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatusError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Request<Result<VideoRecord, UpdateVideoStatusError>> for UpdateVideoStatusCommand {}

impl crate::cqrs::middleware::Command for UpdateVideoStatusCommand {}

impl UpdateVideoStatusCommand {
    pub fn new(video_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            status: status.into(),
        }
    }

    /// Validates the id and returns the parsed status
    pub fn validate(&self) -> Result<VideoStatus, UpdateVideoStatusError> {
        validate_required_text("video_id", &self.video_id, MAX_VIDEO_ID_LEN)?;
        Ok(self.status.parse()?)
    }
}

#[tracing::instrument(skip(store, command), fields(video_id = %command.video_id, status = %command.status))]
pub async fn handle(
    store: SharedVideoStore,
    command: UpdateVideoStatusCommand,
) -> Result<VideoRecord, UpdateVideoStatusError> {
    let status = command.validate()?;

    let record = store.update_status(&command.video_id, status).await?;

    tracing::info!(
        video_id = %record.video_id,
        status = %record.status,
        terminal = record.status.is_terminal(),
        "Video status updated"
    );

    Ok(record)
}
