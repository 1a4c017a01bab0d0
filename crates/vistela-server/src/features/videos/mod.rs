pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateVideoCommand, CreateVideoError, UpdateVideoStatusCommand, UpdateVideoStatusError,
    UploadVideoCommand, UploadVideoError, UploadVideoResponse,
};

pub use queries::{
    GetVideoError, GetVideoQuery, ListStatusVideosError, ListStatusVideosQuery, ListUserVideosError,
    ListUserVideosQuery, ListVideosError, ListVideosQuery, ListVideosResponse, VideoPageResponse,
    VideoStatsError, VideoStatsQuery, VideoStatsResponse,
};

pub use routes::{status_videos_routes, upload_routes, user_videos_routes, videos_routes, UploadState};
