//! Register a video record
//!
//! The record starts as `pending` with `created_at == updated_at`; the
//! caller supplies identity, owner, filename and storage key.

use mediator::Request;
use serde::{Deserialize, Serialize};
use vistela_common::types::{MAX_FILENAME_LEN, MAX_STORAGE_KEY_LEN, MAX_USER_ID_LEN, MAX_VIDEO_ID_LEN};

use crate::db::{NewVideo, SharedVideoStore, StoreError, VideoRecord};
use crate::features::shared::validation::{validate_required_text, FieldValidationError};

/// Command to register a new video
///
/// # Examples
///
/// ```rust,ignore
/// let command = CreateVideoCommand {
///     video_id: "v1".to_string(),
///     user_id: "u1".to_string(),
///     filename: "a.mp4".to_string(),
///     storage_key: "videos/u1/v1/a.mp4".to_string(),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideoCommand {
    pub video_id: String,
    pub user_id: String,
    pub filename: String,
    /// Object key of the uploaded source; `s3_key` is accepted as an alias
    #[serde(alias = "s3_key")]
    pub storage_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateVideoError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Request<Result<VideoRecord, CreateVideoError>> for CreateVideoCommand {}

impl crate::cqrs::middleware::Command for CreateVideoCommand {}

impl CreateVideoCommand {
    #[tracing::instrument(skip(self), fields(video_id = %self.video_id))]
    pub fn validate(&self) -> Result<(), CreateVideoError> {
        validate_required_text("video_id", &self.video_id, MAX_VIDEO_ID_LEN)?;
        validate_required_text("user_id", &self.user_id, MAX_USER_ID_LEN)?;
        validate_required_text("filename", &self.filename, MAX_FILENAME_LEN)?;
        validate_required_text("storage_key", &self.storage_key, MAX_STORAGE_KEY_LEN)?;
        Ok(())
    }
}

impl From<CreateVideoCommand> for NewVideo {
    fn from(command: CreateVideoCommand) -> Self {
        NewVideo::new(command.video_id, command.user_id, command.filename, command.storage_key)
    }
}

#[tracing::instrument(skip(store, command), fields(video_id = %command.video_id, user_id = %command.user_id))]
pub async fn handle(
    store: SharedVideoStore,
    command: CreateVideoCommand,
) -> Result<VideoRecord, CreateVideoError> {
    command.validate()?;

    let record = store.create(command.into()).await?;

    tracing::info!(
        video_id = %record.video_id,
        storage_key = %record.storage_key,
        "Video record created"
    );

    Ok(record)
}
