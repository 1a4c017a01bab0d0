//! Test helpers and fixtures for store-backed tests
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::features::shared::test_helpers::*;
//!
//! let store = memory_store();
//! let video = TestVideo::new("v1", "u1").with_filename("intro.mov").insert(&store).await?;
//! ```

use std::sync::Arc;
use vistela_common::VideoStatus;

use crate::db::{MemoryVideoStore, NewVideo, SharedVideoStore, StoreResult, VideoRecord};

/// Fresh, empty in-memory store
pub fn memory_store() -> SharedVideoStore {
    Arc::new(MemoryVideoStore::new())
}

/// Builder for test video records
#[derive(Debug, Clone)]
pub struct TestVideo {
    pub video_id: String,
    pub user_id: String,
    pub filename: String,
    pub storage_key: Option<String>,
    pub status: Option<VideoStatus>,
}

impl TestVideo {
    pub fn new(video_id: &str, user_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            user_id: user_id.to_string(),
            filename: "clip.mp4".to_string(),
            storage_key: None,
            status: None,
        }
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = filename.to_string();
        self
    }

    pub fn with_storage_key(mut self, key: &str) -> Self {
        self.storage_key = Some(key.to_string());
        self
    }

    /// Move the record to `status` right after creating it
    pub fn with_status(mut self, status: VideoStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn to_new_video(&self) -> NewVideo {
        let storage_key = self.storage_key.clone().unwrap_or_else(|| {
            format!("videos/{}/{}/{}", self.user_id, self.video_id, self.filename)
        });
        NewVideo::new(&self.video_id, &self.user_id, &self.filename, storage_key)
    }

    pub async fn insert(&self, store: &SharedVideoStore) -> StoreResult<VideoRecord> {
        let record = store.create(self.to_new_video()).await?;
        match self.status {
            Some(status) if status != record.status => store.update_status(&record.video_id, status).await,
            _ => Ok(record),
        }
    }
}
