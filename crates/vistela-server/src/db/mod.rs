//! Persistence for video records
//!
//! [`videos`] defines the [`VideoStore`] contract and the record types,
//! [`postgres`] and [`memory`] implement it.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{DatabaseConfig, DatabaseTarget, StoreBackend};
use crate::features::shared::validation::FieldValidationError;

pub mod memory;
pub mod postgres;
pub mod videos;

pub use memory::MemoryVideoStore;
pub use postgres::PgVideoStore;
pub use videos::{
    NewVideo, PageCursor, SharedVideoStore, StatusCounts, VideoFilter, VideoPage, VideoRecord,
    VideoStore,
};

/// Errors surfaced by a [`VideoStore`]
///
/// Nothing here is retried; the caller owns retry policy.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record with this `video_id` already exists
    #[error("Video '{0}' already exists")]
    DuplicateKey(String),

    /// No record with this `video_id`
    #[error("Video '{0}' not found")]
    NotFound(String),

    /// Field out of bounds, missing, or an unknown status label
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backing database could not be reached
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Any other driver error
    #[error("Database query failed: {0}")]
    Database(#[source] sqlx::Error),

    /// Database configuration is invalid or missing
    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::StorageUnavailable(err.to_string()),
            sqlx::Error::Configuration(e) => StoreError::Config(e.to_string()),
            other => StoreError::Database(other),
        }
    }
}

impl From<FieldValidationError> for StoreError {
    fn from(err: FieldValidationError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

impl From<vistela_common::UnknownStatusError> for StoreError {
    fn from(err: vistela_common::UnknownStatusError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Check if the error is a unique constraint violation
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = error {
        return db_err.is_unique_violation();
    }
    false
}

/// Build a connection pool
///
/// Sessions are pinned to UTC: the `videos` timestamps are stored without a
/// time zone and read back as UTC.
pub async fn create_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let connect_options = match &config.target {
        DatabaseTarget::Url(url) => PgConnectOptions::from_str(url)?,
        DatabaseTarget::Parts {
            host,
            port,
            user,
            password,
            name,
        } => PgConnectOptions::new()
            .host(host)
            .port(*port)
            .username(user)
            .password(password)
            .database(name),
    }
    .options([("TimeZone", "UTC")]);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect_with(connect_options)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Apply the bundled migrations
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(e.into()))?;

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Open the configured backend
pub async fn open_store(backend: StoreBackend, config: &DatabaseConfig) -> StoreResult<SharedVideoStore> {
    match backend {
        StoreBackend::Postgres => {
            let pool = create_pool(config).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PgVideoStore::new(pool)))
        },
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory video store; records are lost on restart");
            Ok(Arc::new(MemoryVideoStore::new()))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_unavailable() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::StorageUnavailable(_)));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(StoreError::from(sqlx::Error::Io(io)), StoreError::StorageUnavailable(_)));
    }

    #[test]
    fn test_other_driver_errors_are_database() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_row_not_found_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_validation_errors_convert() {
        let err = StoreError::from(FieldValidationError::Required { field: "user_id" });
        assert!(matches!(err, StoreError::Validation(ref msg) if msg.contains("user_id")));

        let err = StoreError::from(vistela_common::UnknownStatusError("archived".into()));
        assert!(matches!(err, StoreError::Validation(ref msg) if msg.contains("archived")));
    }
}
