//! Vistela Server Library
//!
//! System of record for uploaded videos: every video gets one record that
//! tracks its owner, its source object and where it is in the processing
//! lifecycle.
//!
//! # Overview
//!
//! - **Store**: [`db::VideoStore`] with PostgreSQL and in-memory backends
//! - **API Endpoints**: register, read, list and update records under `/api/v1`
//! - **Storage Backend**: optional S3-compatible upload of source files
//! - **Configuration**: environment-based configuration management
//! - **Middleware**: CORS, request tracing and compression
//!
//! # Architecture
//!
//! Feature slices follow a CQRS layout: commands (create, update status,
//! upload) change records, queries (get, list, page, stats) read them.
//! Each has its own validation and error type; routes map those errors to
//! HTTP through [`error::AppError`].
//!
//! # Example
//!
//! ```no_run
//! use vistela_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod storage;

// Re-export commonly used types
pub use db::{StoreError, StoreResult, VideoStore};
pub use error::AppError;
