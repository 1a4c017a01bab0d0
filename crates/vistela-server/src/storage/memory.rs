//! In-process [`ObjectStorage`] for tests and storage-less local runs

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::config::{DEFAULT_KEY_PREFIX, DEFAULT_MAX_UPLOAD_BYTES};
use super::{build_key, calculate_sha256, ObjectExists, ObjectStorage, UploadResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

pub struct MemoryObjectStorage {
    objects: RwLock<HashMap<String, StoredObject>>,
    key_prefix: String,
    max_upload_bytes: usize,
    unavailable: AtomicBool,
}

impl Default for MemoryObjectStorage {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX, DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl MemoryObjectStorage {
    pub fn new(key_prefix: impl Into<String>, max_upload_bytes: usize) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            key_prefix: key_prefix.into(),
            max_upload_bytes,
            unavailable: AtomicBool::new(false),
        }
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// While set, every put and delete fails as an unreachable endpoint would
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("Object storage endpoint unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    fn object_key(&self, user_id: &str, video_id: &str, filename: &str) -> String {
        build_key(&self.key_prefix, user_id, video_id, filename)
    }

    fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    async fn put_new(&self, key: &str, data: Vec<u8>, content_type: Option<String>) -> Result<UploadResult> {
        self.check_available()?;

        let mut objects = self.objects.write().await;
        if objects.contains_key(key) {
            return Err(ObjectExists { key: key.to_string() }.into());
        }

        let result = UploadResult {
            key: key.to_string(),
            checksum: calculate_sha256(&data),
            size: data.len() as i64,
        };
        objects.insert(key.to_string(), StoredObject { data, content_type });
        Ok(result)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.objects.write().await.remove(key);
        Ok(())
    }
}
