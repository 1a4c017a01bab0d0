use mediator::Request;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vistela_common::{types::MAX_USER_ID_LEN, VideoStatus};

use crate::db::{SharedVideoStore, StoreError};
use crate::features::shared::validation::{validate_optional_text, FieldValidationError};

/// Record counts per status, across all users or for one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoStatsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStatsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Every known status, zero when absent
    pub by_status: BTreeMap<VideoStatus, i64>,
    pub total: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum VideoStatsError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Request<Result<VideoStatsResponse, VideoStatsError>> for VideoStatsQuery {}

impl crate::cqrs::middleware::Query for VideoStatsQuery {}

impl VideoStatsQuery {
    pub fn validate(&self) -> Result<(), VideoStatsError> {
        validate_optional_text("user_id", self.user_id.as_deref(), MAX_USER_ID_LEN)?;
        Ok(())
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: SharedVideoStore,
    query: VideoStatsQuery,
) -> Result<VideoStatsResponse, VideoStatsError> {
    query.validate()?;

    let counts = store.count_by_status(query.user_id.as_deref()).await?;

    let by_status: BTreeMap<VideoStatus, i64> = VideoStatus::ALL
        .into_iter()
        .map(|status| (status, counts.get(&status).copied().unwrap_or(0)))
        .collect();
    let total = by_status.values().sum();

    Ok(VideoStatsResponse {
        user_id: query.user_id,
        by_status,
        total,
    })
}
