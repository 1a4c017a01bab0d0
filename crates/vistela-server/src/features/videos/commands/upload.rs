//! Upload a source file and register its record
//!
//! The object is written first with a put that never replaces an existing
//! key, then the record is created pointing at it. If the record cannot be
//! created, the object this request wrote is removed again. An object that
//! was already there is never touched.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vistela_common::types::{MAX_FILENAME_LEN, MAX_STORAGE_KEY_LEN, MAX_USER_ID_LEN, MAX_VIDEO_ID_LEN};

use crate::db::{NewVideo, SharedVideoStore, StoreError, VideoRecord};
use crate::features::shared::validation::{
    validate_optional_text, validate_required_text, FieldValidationError,
};
use crate::storage::{ObjectExists, SharedObjectStorage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadVideoCommand {
    pub user_id: String,
    pub filename: String,
    /// Generated when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadVideoResponse {
    pub video: VideoRecord,
    /// Hex SHA-256 of the uploaded bytes
    pub checksum: String,
    pub size: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadVideoError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),
    #[error("Filename must not contain path separators or be '.' or '..'")]
    InvalidFilename,
    #[error("Content is required and cannot be empty")]
    ContentRequired,
    #[error("Storage key exceeds 1000 characters")]
    KeyTooLong,
    #[error("Video '{0}' already exists")]
    AlreadyUploaded(String),
    #[error("Object storage error: {0}")]
    Storage(#[from] anyhow::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Request<Result<UploadVideoResponse, UploadVideoError>> for UploadVideoCommand {}

impl crate::cqrs::middleware::Command for UploadVideoCommand {}

impl UploadVideoCommand {
    pub fn validate(&self) -> Result<(), UploadVideoError> {
        validate_required_text("user_id", &self.user_id, MAX_USER_ID_LEN)?;
        validate_required_text("filename", &self.filename, MAX_FILENAME_LEN)?;
        validate_optional_text("video_id", self.video_id.as_deref(), MAX_VIDEO_ID_LEN)?;

        if self.filename.contains(['/', '\\']) || matches!(self.filename.as_str(), "." | "..") {
            return Err(UploadVideoError::InvalidFilename);
        }
        if self.content.is_empty() {
            return Err(UploadVideoError::ContentRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(store, storage, command), fields(user_id = %command.user_id, filename = %command.filename))]
pub async fn handle(
    store: SharedVideoStore,
    storage: SharedObjectStorage,
    command: UploadVideoCommand,
) -> Result<UploadVideoResponse, UploadVideoError> {
    command.validate()?;

    let video_id = command
        .video_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let key = storage.object_key(&command.user_id, &video_id, &command.filename);
    if key.chars().count() > MAX_STORAGE_KEY_LEN {
        return Err(UploadVideoError::KeyTooLong);
    }

    let uploaded = match storage.put_new(&key, command.content, command.content_type).await {
        Ok(uploaded) => uploaded,
        Err(e) if e.is::<ObjectExists>() => {
            tracing::warn!(video_id = %video_id, key = %key, "Upload refused, object already exists");
            return Err(UploadVideoError::AlreadyUploaded(video_id));
        },
        Err(e) => return Err(UploadVideoError::Storage(e)),
    };

    let new_video = NewVideo::new(&video_id, command.user_id, command.filename, &uploaded.key);
    let video = match store.create(new_video).await {
        Ok(video) => video,
        Err(e) => {
            if let Err(cleanup) = storage.delete(&uploaded.key).await {
                tracing::warn!(key = %uploaded.key, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        },
    };

    tracing::info!(
        video_id = %video.video_id,
        key = %uploaded.key,
        size = uploaded.size,
        "Video uploaded"
    );

    Ok(UploadVideoResponse {
        video,
        checksum: uploaded.checksum,
        size: uploaded.size,
    })
}
