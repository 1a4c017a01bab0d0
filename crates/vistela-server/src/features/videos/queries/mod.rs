use serde::{Deserialize, Serialize};

use crate::db::VideoRecord;
use crate::features::shared::pagination::CursorMetadata;

pub mod get;
pub mod list;
pub mod list_by_status;
pub mod list_by_user;
pub mod stats;

pub use get::{GetVideoError, GetVideoQuery};
pub use list::{ListVideosError, ListVideosQuery, ListVideosResponse};
pub use list_by_status::{ListStatusVideosError, ListStatusVideosQuery};
pub use list_by_user::{ListUserVideosError, ListUserVideosQuery};
pub use stats::{VideoStatsError, VideoStatsQuery, VideoStatsResponse};

/// Keyset page returned by the per-user and per-status listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoPageResponse {
    pub items: Vec<VideoRecord>,
    pub pagination: CursorMetadata,
}
