use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::response::ApiResponse;
use crate::db::{SharedVideoStore, StoreError};
use crate::error::AppError;
use crate::features::shared::pagination::CursorParams;
use crate::storage::SharedObjectStorage;

use super::commands::{
    CreateVideoCommand, CreateVideoError, UpdateVideoStatusCommand, UpdateVideoStatusError,
    UploadVideoCommand, UploadVideoError,
};
use super::queries::{
    GetVideoError, GetVideoQuery, ListStatusVideosError, ListStatusVideosQuery, ListUserVideosError,
    ListUserVideosQuery, ListVideosError, ListVideosQuery, VideoStatsError, VideoStatsQuery,
};

/// State for the upload route, which needs object storage as well
#[derive(Clone)]
pub struct UploadState {
    pub store: SharedVideoStore,
    pub storage: SharedObjectStorage,
}

/// `/videos` routes backed by the store alone
pub fn videos_routes() -> Router<SharedVideoStore> {
    Router::new()
        .route("/", post(create_video).get(list_videos))
        .route("/stats", get(video_stats))
        .route("/:video_id", get(get_video))
        .route("/:video_id/status", put(update_video_status))
}

/// `/videos/upload`, mounted only when object storage is configured
pub fn upload_routes(max_upload_bytes: usize) -> Router<UploadState> {
    Router::new()
        .route("/upload", post(upload_video))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// `/users/:user_id/videos`
pub fn user_videos_routes() -> Router<SharedVideoStore> {
    Router::new().route("/:user_id/videos", get(list_user_videos))
}

/// `/statuses/:status/videos`
pub fn status_videos_routes() -> Router<SharedVideoStore> {
    Router::new().route("/:status/videos", get(list_status_videos))
}

#[tracing::instrument(skip(store, payload))]
async fn create_video(
    State(store): State<SharedVideoStore>,
    payload: Result<Json<CreateVideoCommand>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(command) = payload?;
    let record = super::commands::create::handle(store, command).await?;
    Ok(ApiResponse::created(record).into_response())
}

#[tracing::instrument(skip(store, payload))]
async fn update_video_status(
    State(store): State<SharedVideoStore>,
    Path(video_id): Path<String>,
    payload: Result<Json<UpdateVideoStatusCommand>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload?;
    let command = UpdateVideoStatusCommand::new(video_id, body.status);
    let record = super::commands::update_status::handle(store, command).await?;
    Ok(ApiResponse::success(record).into_response())
}

#[tracing::instrument(skip(store))]
async fn get_video(
    State(store): State<SharedVideoStore>,
    Path(video_id): Path<String>,
) -> Result<Response, AppError> {
    let record = super::queries::get::handle(store, GetVideoQuery { video_id }).await?;
    Ok(ApiResponse::success(record).into_response())
}

#[tracing::instrument(skip(store, params))]
async fn list_videos(
    State(store): State<SharedVideoStore>,
    params: Result<Query<ListVideosQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = params?;
    let response = super::queries::list::handle(store, query).await?;
    Ok(ApiResponse::success(response).into_response())
}

#[tracing::instrument(skip(store, params))]
async fn video_stats(
    State(store): State<SharedVideoStore>,
    params: Result<Query<VideoStatsQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = params?;
    let response = super::queries::stats::handle(store, query).await?;
    Ok(ApiResponse::success(response).into_response())
}

#[tracing::instrument(skip(store, params))]
async fn list_user_videos(
    State(store): State<SharedVideoStore>,
    Path(user_id): Path<String>,
    params: Result<Query<CursorParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(page) = params?;
    let response = super::queries::list_by_user::handle(store, ListUserVideosQuery { user_id, page }).await?;
    Ok(ApiResponse::success(response).into_response())
}

#[tracing::instrument(skip(store, params))]
async fn list_status_videos(
    State(store): State<SharedVideoStore>,
    Path(status): Path<String>,
    params: Result<Query<CursorParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(page) = params?;
    let response = super::queries::list_by_status::handle(store, ListStatusVideosQuery { status, page }).await?;
    Ok(ApiResponse::success(response).into_response())
}

/// Text fields accepted next to the `file` part
#[derive(Debug, Default, Deserialize)]
struct UploadFields {
    user_id: Option<String>,
    video_id: Option<String>,
    filename: Option<String>,
}

#[tracing::instrument(skip(state, multipart))]
async fn upload_video(
    State(state): State<UploadState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut fields = UploadFields::default();
    let mut content: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;
    let mut part_filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                content_type = field.content_type().map(str::to_string);
                part_filename = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file bytes: {}", e)))?;
                content = Some(data.to_vec());
            },
            "user_id" | "video_id" | "filename" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read field '{}': {}", name, e)))?;
                match name.as_str() {
                    "user_id" => fields.user_id = Some(value),
                    "video_id" => fields.video_id = Some(value),
                    _ => fields.filename = Some(value),
                }
            },
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    let content = content.ok_or_else(|| AppError::Validation("No file field found in multipart data".into()))?;

    let command = UploadVideoCommand {
        user_id: fields.user_id.unwrap_or_default(),
        filename: fields.filename.or(part_filename).unwrap_or_default(),
        video_id: fields.video_id,
        content,
        content_type,
    };

    let response = super::commands::upload::handle(state.store, state.storage, command).await?;

    Ok(ApiResponse::created(response).into_response())
}

impl From<CreateVideoError> for AppError {
    fn from(err: CreateVideoError) -> Self {
        match err {
            CreateVideoError::Validation(e) => AppError::Validation(e.to_string()),
            CreateVideoError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<UpdateVideoStatusError> for AppError {
    fn from(err: UpdateVideoStatusError) -> Self {
        match err {
            UpdateVideoStatusError::Validation(e) => AppError::Validation(e.to_string()),
            UpdateVideoStatusError::UnknownStatus(e) => AppError::Validation(e.to_string()),
            UpdateVideoStatusError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<UploadVideoError> for AppError {
    fn from(err: UploadVideoError) -> Self {
        match err {
            UploadVideoError::Store(e) => AppError::Store(e),
            UploadVideoError::Storage(e) => AppError::Unavailable(format!("{:#}", e)),
            UploadVideoError::AlreadyUploaded(video_id) => AppError::Store(StoreError::DuplicateKey(video_id)),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<GetVideoError> for AppError {
    fn from(err: GetVideoError) -> Self {
        match err {
            GetVideoError::Validation(e) => AppError::Validation(e.to_string()),
            GetVideoError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<ListVideosError> for AppError {
    fn from(err: ListVideosError) -> Self {
        match err {
            ListVideosError::Validation(e) => AppError::Validation(e.to_string()),
            ListVideosError::UnknownStatus(e) => AppError::Validation(e.to_string()),
            ListVideosError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<ListUserVideosError> for AppError {
    fn from(err: ListUserVideosError) -> Self {
        match err {
            ListUserVideosError::Validation(e) => AppError::Validation(e.to_string()),
            ListUserVideosError::InvalidCursor(e) => AppError::Validation(e.to_string()),
            ListUserVideosError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<ListStatusVideosError> for AppError {
    fn from(err: ListStatusVideosError) -> Self {
        match err {
            ListStatusVideosError::UnknownStatus(e) => AppError::Validation(e.to_string()),
            ListStatusVideosError::InvalidCursor(e) => AppError::Validation(e.to_string()),
            ListStatusVideosError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<VideoStatsError> for AppError {
    fn from(err: VideoStatsError) -> Self {
        match err {
            VideoStatsError::Validation(e) => AppError::Validation(e.to_string()),
            VideoStatsError::Store(e) => AppError::Store(e),
        }
    }
}
