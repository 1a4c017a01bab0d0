//! Domain types shared by the store and the API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of `video_id`, in characters
pub const MAX_VIDEO_ID_LEN: usize = 255;

/// Maximum length of `user_id`, in characters
pub const MAX_USER_ID_LEN: usize = 255;

/// Maximum length of `filename`, in characters
pub const MAX_FILENAME_LEN: usize = 500;

/// Maximum length of the storage key (`s3_key` column), in characters
pub const MAX_STORAGE_KEY_LEN: usize = 1000;

/// Maximum length of a persisted status label, in characters
pub const MAX_STATUS_LEN: usize = 50;

/// Lifecycle label of a video record
///
/// Persisted as the lowercase string returned by [`VideoStatus::as_str`].
/// No transition table is enforced here; the processing pipeline owns
/// which moves are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    /// Record created by intake, nothing processed yet
    #[default]
    Pending,
    /// Source bytes confirmed in object storage
    Uploaded,
    /// A pipeline stage is working on the video
    Processing,
    /// Output available for delivery
    Ready,
    /// Pipeline finished all stages
    Completed,
    /// Pipeline gave up on the video
    Failed,
}

impl VideoStatus {
    /// Every known status, in lifecycle order
    pub const ALL: [VideoStatus; 6] = [
        VideoStatus::Pending,
        VideoStatus::Uploaded,
        VideoStatus::Processing,
        VideoStatus::Ready,
        VideoStatus::Completed,
        VideoStatus::Failed,
    ];

    /// Persisted representation
    pub fn as_str(self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Ready => "ready",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Whether the pipeline is done with this video, successfully or not
    pub fn is_terminal(self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status label that is not one of [`VideoStatus::ALL`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown video status '{0}'. Must be one of: pending, uploaded, processing, ready, completed, failed")]
pub struct UnknownStatusError(pub String);

impl FromStr for VideoStatus {
    type Err = UnknownStatusError;

    /// Parses the persisted label. Matching is exact: labels are stored
    /// lowercase and anything else is treated as foreign data.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatusError(s.to_string()))
    }
}

impl TryFrom<String> for VideoStatus {
    type Error = UnknownStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
