//! Video record types and the store contract

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use vistela_common::types::{
    VideoStatus, MAX_FILENAME_LEN, MAX_STORAGE_KEY_LEN, MAX_USER_ID_LEN, MAX_VIDEO_ID_LEN,
};

use super::{StoreError, StoreResult};
use crate::features::shared::validation::{validate_required_text, FieldValidationError};

/// Default `limit` for [`VideoStore::list`]
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Largest `limit` honored by [`VideoStore::list`]
pub const MAX_LIST_LIMIT: usize = 1000;

/// A persisted video record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub user_id: String,
    pub filename: String,
    /// Location of the source object, persisted in the `s3_key` column
    pub storage_key: String,
    pub status: VideoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Position of this record in `(created_at, video_id)` descending order
    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            created_at: self.created_at,
            video_id: self.video_id.clone(),
        }
    }
}

/// Caller-supplied fields of a new record
///
/// Status and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVideo {
    pub video_id: String,
    pub user_id: String,
    pub filename: String,
    pub storage_key: String,
}

impl NewVideo {
    pub fn new(
        video_id: impl Into<String>,
        user_id: impl Into<String>,
        filename: impl Into<String>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            user_id: user_id.into(),
            filename: filename.into(),
            storage_key: storage_key.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldValidationError> {
        validate_required_text("video_id", &self.video_id, MAX_VIDEO_ID_LEN)?;
        validate_required_text("user_id", &self.user_id, MAX_USER_ID_LEN)?;
        validate_required_text("filename", &self.filename, MAX_FILENAME_LEN)?;
        validate_required_text("storage_key", &self.storage_key, MAX_STORAGE_KEY_LEN)?;
        Ok(())
    }
}

/// Compound filter for [`VideoStore::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFilter {
    pub user_id: Option<String>,
    pub status: Option<VideoStatus>,
    pub limit: usize,
}

impl Default for VideoFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            status: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl VideoFilter {
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_status(mut self, status: VideoStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Limit actually applied, capped at [`MAX_LIST_LIMIT`]
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_LIST_LIMIT)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid page cursor")]
pub struct InvalidCursorError;

/// Keyset position: the last `(created_at, video_id)` a caller has seen
///
/// Pages continue strictly after this position in descending order, so
/// records inserted while a caller is paging never cause duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub created_at: DateTime<Utc>,
    pub video_id: String,
}

impl PageCursor {
    /// Opaque, URL-safe token
    pub fn encode(&self) -> String {
        let raw = format!("{}|{}", self.created_at.timestamp_micros(), self.video_id);
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn decode(token: &str) -> Result<Self, InvalidCursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| InvalidCursorError)?;
        let raw = String::from_utf8(bytes).map_err(|_| InvalidCursorError)?;
        let (micros, video_id) = raw.split_once('|').ok_or(InvalidCursorError)?;
        let micros: i64 = micros.parse().map_err(|_| InvalidCursorError)?;
        let created_at = DateTime::from_timestamp_micros(micros).ok_or(InvalidCursorError)?;

        if video_id.is_empty() {
            return Err(InvalidCursorError);
        }

        Ok(Self {
            created_at,
            video_id: video_id.to_string(),
        })
    }
}

/// One page of a keyset listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoPage {
    pub items: Vec<VideoRecord>,
    /// Present when more records follow this page
    pub next_cursor: Option<PageCursor>,
}

impl VideoPage {
    /// Build a page from up to `limit + 1` fetched rows
    ///
    /// The extra row only signals that another page exists and is dropped.
    pub fn from_overfetch(mut rows: Vec<VideoRecord>, limit: usize) -> Self {
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(VideoRecord::cursor)
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
        }
    }
}

/// Record count per status
pub type StatusCounts = BTreeMap<VideoStatus, i64>;

/// Durable registry of video records
///
/// `video_id` is unique. Ordered listings are newest first with `video_id`
/// descending as the tie-break. A `limit` of zero yields an empty result.
#[async_trait]
pub trait VideoStore: Send + Sync + 'static {
    /// Insert a record with status `pending` and both timestamps set to now
    async fn create(&self, video: NewVideo) -> StoreResult<VideoRecord>;

    /// Change the status of an existing record and refresh `updated_at`
    async fn update_status(&self, video_id: &str, status: VideoStatus) -> StoreResult<VideoRecord>;

    async fn get(&self, video_id: &str) -> StoreResult<VideoRecord>;

    async fn list_by_user(
        &self,
        user_id: &str,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> StoreResult<VideoPage>;

    async fn list_by_status(
        &self,
        status: VideoStatus,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> StoreResult<VideoPage>;

    /// The `limit` newest records across all users
    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<VideoRecord>>;

    /// Newest records matching every given filter
    async fn list(&self, filter: &VideoFilter) -> StoreResult<Vec<VideoRecord>>;

    /// Records per status, optionally for a single user
    async fn count_by_status(&self, user_id: Option<&str>) -> StoreResult<StatusCounts>;

    /// Cheap liveness check
    async fn ping(&self) -> StoreResult<()>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}

pub type SharedVideoStore = Arc<dyn VideoStore>;

/// Every record of `user_id`, newest first, fetched one page at a time
///
/// Pages are requested lazily as the stream is polled. Resume an interrupted
/// walk by passing the cursor of the last record received as `from`.
pub fn stream_by_user(
    store: SharedVideoStore,
    user_id: impl Into<String>,
    from: Option<PageCursor>,
    page_size: usize,
) -> BoxStream<'static, StoreResult<VideoRecord>> {
    let user_id = user_id.into();
    paged(from, page_size, move |after, limit| {
        let store = Arc::clone(&store);
        let user_id = user_id.clone();
        async move { store.list_by_user(&user_id, after.as_ref(), limit).await }
    })
}

/// Every record in `status`, newest first, fetched one page at a time
pub fn stream_by_status(
    store: SharedVideoStore,
    status: VideoStatus,
    from: Option<PageCursor>,
    page_size: usize,
) -> BoxStream<'static, StoreResult<VideoRecord>> {
    paged(from, page_size, move |after, limit| {
        let store = Arc::clone(&store);
        async move { store.list_by_status(status, after.as_ref(), limit).await }
    })
}

enum Walk {
    Next(Option<PageCursor>),
    Done,
}

fn paged<F, Fut>(
    from: Option<PageCursor>,
    page_size: usize,
    fetch: F,
) -> BoxStream<'static, StoreResult<VideoRecord>>
where
    F: Fn(Option<PageCursor>, usize) -> Fut + Send + 'static,
    Fut: Future<Output = StoreResult<VideoPage>> + Send + 'static,
{
    let page_size = page_size.max(1);

    stream::unfold((Walk::Next(from), fetch), move |(walk, fetch)| async move {
        let after = match walk {
            Walk::Next(after) => after,
            Walk::Done => return None,
        };

        // An error ends the walk after it is yielded
        let (batch, walk): (Vec<StoreResult<VideoRecord>>, Walk) = match fetch(after, page_size).await {
            Ok(page) => {
                let walk = match page.next_cursor {
                    Some(cursor) => Walk::Next(Some(cursor)),
                    None => Walk::Done,
                };
                (page.items.into_iter().map(Ok).collect(), walk)
            },
            Err(e) => (vec![Err(e)], Walk::Done),
        };

        Some((stream::iter(batch), (walk, fetch)))
    })
    .flatten()
    .boxed()
}

/// Convert a persisted status label, rejecting labels this build does not know
pub(crate) fn parse_status(video_id: &str, label: &str) -> StoreResult<VideoStatus> {
    label.parse().map_err(|_| {
        StoreError::validation(format!("Video '{}' has unknown status '{}'", video_id, label))
    })
}
