//! HTTP surface: router assembly, health checks and the serve loop

pub mod response;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::compression::CompressionLayer;

use crate::config::{Config, CorsConfig};
use crate::db::{self, SharedVideoStore};
use crate::features;
use crate::middleware;
use crate::storage::{S3Storage, SharedObjectStorage};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedVideoStore,
    pub storage: Option<SharedObjectStorage>,
}

/// Open the store and object storage, then serve until a shutdown signal
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = db::open_store(config.store, &config.database).await?;
    tracing::info!(backend = store.backend(), "Video store ready");

    let storage = match config.storage.clone() {
        Some(storage_config) => Some(Arc::new(S3Storage::new(storage_config)?) as SharedObjectStorage),
        None => {
            tracing::info!("S3_BUCKET_NAME not set; upload route disabled");
            None
        },
    };

    let app = create_router(AppState { store, storage }, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    // In-flight requests get the configured grace period, then are dropped
    let drain_limit = Duration::from_secs(config.server.shutdown_timeout_secs);
    let forced = async move {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(drain_limit).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server => result?,
        _ = forced => {
            tracing::warn!(timeout_secs = drain_limit.as_secs(), "Connections still open after timeout, shutting down");
        },
    }

    tracing::info!("Server shut down");
    Ok(())
}

/// Application router with all routes and middleware
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    let feature_state = features::FeatureState {
        store: state.store.clone(),
        storage: state.storage.clone(),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state)
        .nest("/api/v1", features::router(feature_state))
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Vistela",
        "version": env!("CARGO_PKG_VERSION"),
        "api": "/api/v1",
    }))
}

async fn health_check(State(state): State<AppState>) -> Response {
    let backend = state.store.backend();
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "store": backend,
                "uploads": state.storage.is_some(),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, store = backend, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "store": backend,
                })),
            )
                .into_response()
        },
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received terminate signal, starting graceful shutdown"),
    }
}
