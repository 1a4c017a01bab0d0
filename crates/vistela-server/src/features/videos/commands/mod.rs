pub mod create;
pub mod update_status;
pub mod upload;

pub use create::{CreateVideoCommand, CreateVideoError};
pub use update_status::{UpdateVideoStatusCommand, UpdateVideoStatusError};
pub use upload::{UploadVideoCommand, UploadVideoError, UploadVideoResponse};
