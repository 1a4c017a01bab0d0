use serde::{Deserialize, Serialize};
use std::env;

/// Default key prefix for uploaded sources
pub const DEFAULT_KEY_PREFIX: &str = "videos";

/// Default attempts per S3 call, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default largest accepted upload body (512 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub path_style: bool,
    pub key_prefix: String,
    pub max_attempts: u32,
    pub max_upload_bytes: usize,
}

impl StorageConfig {
    /// Read S3 settings
    ///
    /// Returns `Ok(None)` when no bucket is configured. A bucket without
    /// credentials is an error rather than a silent fallback.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        let Some(bucket) = env::var("S3_BUCKET_NAME").or_else(|_| env::var("S3_BUCKET")).ok() else {
            return Ok(None);
        };

        let access_key = env::var("AWS_ACCESS_KEY_ID")
            .or_else(|_| env::var("S3_ACCESS_KEY"))
            .map_err(|_| anyhow::anyhow!("AWS_ACCESS_KEY_ID must be set when S3_BUCKET_NAME is set"))?;
        let secret_key = env::var("AWS_SECRET_ACCESS_KEY")
            .or_else(|_| env::var("S3_SECRET_KEY"))
            .map_err(|_| anyhow::anyhow!("AWS_SECRET_ACCESS_KEY must be set when S3_BUCKET_NAME is set"))?;

        Ok(Some(Self {
            endpoint: env::var("S3_ENDPOINT").ok(),
            region: env::var("AWS_REGION")
                .or_else(|_| env::var("S3_REGION"))
                .unwrap_or_else(|_| "us-east-1".to_string()),
            bucket,
            access_key,
            secret_key,
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            key_prefix: env::var("S3_KEY_PREFIX").unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string()),
            max_attempts: env::var("S3_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            max_upload_bytes: env::var("VISTELA_MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        }))
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            bucket: bucket.into(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bucket.trim().is_empty() {
            anyhow::bail!("S3 bucket name cannot be empty");
        }
        if self.max_attempts == 0 {
            anyhow::bail!("S3 max attempts must be greater than 0");
        }
        if self.max_upload_bytes == 0 {
            anyhow::bail!("Maximum upload size must be greater than 0");
        }
        Ok(())
    }
}
