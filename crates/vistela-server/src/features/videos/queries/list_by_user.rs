use mediator::Request;
use serde::{Deserialize, Serialize};
use vistela_common::types::MAX_USER_ID_LEN;

use crate::db::{videos::InvalidCursorError, SharedVideoStore, StoreError};
use crate::features::shared::pagination::{CursorMetadata, CursorParams};
use crate::features::shared::validation::{validate_required_text, FieldValidationError};

use super::VideoPageResponse;

/// One keyset page of a user's videos, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUserVideosQuery {
    pub user_id: String,
    #[serde(default)]
    pub page: CursorParams,
}

#[derive(Debug, thiserror::Error)]
pub enum ListUserVideosError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),
    #[error(transparent)]
    InvalidCursor(#[from] InvalidCursorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Request<Result<VideoPageResponse, ListUserVideosError>> for ListUserVideosQuery {}

impl crate::cqrs::middleware::Query for ListUserVideosQuery {}

impl ListUserVideosQuery {
    pub fn validate(&self) -> Result<(), ListUserVideosError> {
        validate_required_text("user_id", &self.user_id, MAX_USER_ID_LEN)?;
        self.page.after()?;
        Ok(())
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: SharedVideoStore,
    query: ListUserVideosQuery,
) -> Result<VideoPageResponse, ListUserVideosError> {
    query.validate()?;

    let after = query.page.after()?;
    let page = store
        .list_by_user(&query.user_id, after.as_ref(), query.page.limit())
        .await?;

    Ok(VideoPageResponse {
        pagination: CursorMetadata::new(page.items.len(), page.next_cursor.as_ref()),
        items: page.items,
    })
}
