//! Feature modules implementing the Vistela API
//!
//! Each feature is a vertical slice following the CQRS (Command Query
//! Responsibility Segregation) pattern:
//! - `commands/` - Write operations (create, update status, upload)
//! - `queries/` - Read operations (get, list, stats)
//! - `routes.rs` - HTTP route definitions
//!
//! Commands and queries implement the mediator pattern using the `mediator`
//! crate; see [`crate::cqrs`].

pub mod shared;
pub mod videos;

use axum::Router;

use crate::db::SharedVideoStore;
use crate::storage::SharedObjectStorage;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub store: SharedVideoStore,
    /// Object storage; the upload route is only mounted when present
    pub storage: Option<SharedObjectStorage>,
}

/// Creates the API router with all feature routes mounted
///
/// - `/videos` - register, read, list, count and update video records
/// - `/videos/upload` - multipart upload (only with object storage)
/// - `/users/:user_id/videos` - keyset pages of one user's videos
/// - `/statuses/:status/videos` - keyset pages of videos in one status
pub fn router(state: FeatureState) -> Router<()> {
    let mut videos = videos::videos_routes().with_state(state.store.clone());

    if let Some(storage) = state.storage {
        let upload = videos::upload_routes(storage.max_upload_bytes()).with_state(videos::UploadState {
            store: state.store.clone(),
            storage,
        });
        videos = videos.merge(upload);
    }

    Router::new()
        .nest("/videos", videos)
        .nest("/users", videos::user_videos_routes().with_state(state.store.clone()))
        .nest("/statuses", videos::status_videos_routes().with_state(state.store))
}
