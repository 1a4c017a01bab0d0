//! Vistela Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, error handling and logging bootstrap for the Vistela workspace.
//!
//! # Overview
//!
//! - **Types**: the video lifecycle status and the persisted field bounds
//! - **Error Handling**: the common error and result types
//! - **Logging**: `tracing` subscriber initialization shared by all binaries
//!
//! # Example
//!
//! ```no_run
//! use vistela_common::types::VideoStatus;
//!
//! let status: VideoStatus = "processing".parse().unwrap();
//! assert_eq!(status.as_str(), "processing");
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, VistelaError};
pub use types::{UnknownStatusError, VideoStatus};
