use mediator::Request;
use serde::{Deserialize, Serialize};
use vistela_common::{UnknownStatusError, VideoStatus};

use crate::db::{videos::InvalidCursorError, SharedVideoStore, StoreError};
use crate::features::shared::pagination::{CursorMetadata, CursorParams};

use super::VideoPageResponse;

/// One keyset page of videos in a status, newest first
///
/// Workers use this to find what to pick up next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListStatusVideosQuery {
    pub status: String,
    #[serde(default)]
    pub page: CursorParams,
}

#[derive(Debug, thiserror::Error)]
pub enum ListStatusVideosError {
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatusError),
    #[error(transparent)]
    InvalidCursor(#[from] InvalidCursorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Request<Result<VideoPageResponse, ListStatusVideosError>> for ListStatusVideosQuery {}

impl crate::cqrs::middleware::Query for ListStatusVideosQuery {}

impl ListStatusVideosQuery {
    pub fn validate(&self) -> Result<VideoStatus, ListStatusVideosError> {
        self.page.after()?;
        Ok(self.status.parse()?)
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: SharedVideoStore,
    query: ListStatusVideosQuery,
) -> Result<VideoPageResponse, ListStatusVideosError> {
    let status = query.validate()?;

    let after = query.page.after()?;
    let page = store
        .list_by_status(status, after.as_ref(), query.page.limit())
        .await?;

    Ok(VideoPageResponse {
        pagination: CursorMetadata::new(page.items.len(), page.next_cursor.as_ref()),
        items: page.items,
    })
}
