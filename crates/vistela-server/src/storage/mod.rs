//! Object storage for uploaded video sources
//!
//! [`ObjectStorage`] is the seam the upload command writes through. The S3
//! client backs it in production and [`MemoryObjectStorage`] in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{retry::RetryConfig, Credentials, Region},
    error::ProvideErrorMetadata,
    primitives::ByteStream,
    Client,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub mod config;
pub mod memory;

pub use memory::MemoryObjectStorage;

/// S3 error codes returned when a conditional put finds the key taken
const PRECONDITION_CODES: [&str; 2] = ["PreconditionFailed", "ConditionalRequestConflict"];

/// A put was refused because an object already lives at the key
#[derive(Debug, thiserror::Error)]
#[error("Object already exists at '{key}'")]
pub struct ObjectExists {
    pub key: String,
}

/// Write-once blob store for video sources
///
/// `put_new` never replaces an existing object. Callers detect the refusal
/// with `err.is::<ObjectExists>()`.
#[async_trait]
pub trait ObjectStorage: Send + Sync + 'static {
    /// Key for a video source: `{prefix}/{user_id}/{video_id}/{filename}`
    fn object_key(&self, user_id: &str, video_id: &str, filename: &str) -> String;

    /// Largest request body the upload route accepts
    fn max_upload_bytes(&self) -> usize;

    async fn put_new(&self, key: &str, data: Vec<u8>, content_type: Option<String>) -> Result<UploadResult>;

    async fn delete(&self, key: &str) -> Result<()>;
}

pub type SharedObjectStorage = Arc<dyn ObjectStorage>;

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    key_prefix: String,
    max_upload_bytes: usize,
}

impl S3Storage {
    pub fn new(config: config::StorageConfig) -> Result<Self> {
        config.validate()?;

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "vistela-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style)
            .retry_config(RetryConfig::adaptive().with_max_attempts(config.max_attempts));

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(bucket = %config.bucket, region = %config.region, "Storage client initialized");

        Ok(Self {
            client,
            bucket: config.bucket,
            key_prefix: config.key_prefix,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn object_key(&self, user_id: &str, video_id: &str, filename: &str) -> String {
        build_key(&self.key_prefix, user_id, video_id, filename)
    }

    fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Conditional put with `If-None-Match: *`
    #[instrument(skip(self, data), fields(bucket = %self.bucket))]
    async fn put_new(&self, key: &str, data: Vec<u8>, content_type: Option<String>) -> Result<UploadResult> {
        let checksum = calculate_sha256(&data);
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .if_none_match("*")
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        if let Err(err) = request.send().await {
            if err.code().is_some_and(|code| PRECONDITION_CODES.contains(&code)) {
                return Err(ObjectExists { key: key.to_string() }.into());
            }
            return Err(anyhow::Error::new(err).context("Failed to upload to S3"));
        }

        info!("Successfully uploaded to s3://{}/{}", self.bucket, key);

        Ok(UploadResult {
            key: key.to_string(),
            checksum,
            size,
        })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context(format!("Failed to delete from S3: {}", key))?;

        info!("Deleted s3://{}/{}", self.bucket, key);

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub key: String,
    pub checksum: String,
    pub size: i64,
}

pub fn build_key(prefix: &str, user_id: &str, video_id: &str, filename: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}/{}", user_id, video_id, filename)
    } else {
        format!("{}/{}/{}/{}", prefix, user_id, video_id, filename)
    }
}

pub(crate) fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
