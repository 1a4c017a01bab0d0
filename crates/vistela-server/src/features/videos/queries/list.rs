//! Bounded listing with optional `user_id` and `status` filters
//!
//! Without filters this is the "most recent videos" view.

use mediator::Request;
use serde::{Deserialize, Serialize};
use vistela_common::{types::MAX_USER_ID_LEN, UnknownStatusError, VideoStatus};

use crate::db::{SharedVideoStore, StoreError, VideoFilter, VideoRecord};
use crate::features::shared::pagination::ListLimit;
use crate::features::shared::validation::{validate_optional_text, FieldValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListVideosQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Defaults to 100, clamped to 1-1000
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListVideosResponse {
    pub items: Vec<VideoRecord>,
    pub count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ListVideosError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatusError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Request<Result<ListVideosResponse, ListVideosError>> for ListVideosQuery {}

impl crate::cqrs::middleware::Query for ListVideosQuery {}

impl ListVideosQuery {
    /// Validates the filters and turns them into a store filter
    pub fn validate(&self) -> Result<VideoFilter, ListVideosError> {
        validate_optional_text("user_id", self.user_id.as_deref(), MAX_USER_ID_LEN)?;
        let status = self
            .status
            .as_deref()
            .map(str::parse::<VideoStatus>)
            .transpose()?;

        Ok(VideoFilter {
            user_id: self.user_id.clone(),
            status,
            limit: ListLimit(self.limit).get(),
        })
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: SharedVideoStore,
    query: ListVideosQuery,
) -> Result<ListVideosResponse, ListVideosError> {
    let filter = query.validate()?;

    let items = if filter.user_id.is_none() && filter.status.is_none() {
        store.list_recent(filter.limit).await?
    } else {
        store.list(&filter).await?
    };

    Ok(ListVideosResponse {
        count: items.len(),
        items,
    })
}
