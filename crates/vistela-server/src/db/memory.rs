//! In-process [`VideoStore`] used by tests and `VISTELA_STORE=memory`
//!
//! Mirrors the relational layout: a primary map keyed by `video_id` plus the
//! three secondary orderings the `videos` table indexes.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use tokio::sync::RwLock;
use vistela_common::VideoStatus;

use super::videos::{NewVideo, PageCursor, StatusCounts, VideoFilter, VideoPage, VideoRecord, VideoStore};
use super::{StoreError, StoreResult};

/// Sorts ascending into `(created_at DESC, video_id DESC)`
type OrderKey = (Reverse<DateTime<Utc>>, Reverse<String>);

fn order_key(record: &VideoRecord) -> OrderKey {
    (Reverse(record.created_at), Reverse(record.video_id.clone()))
}

fn cursor_key(cursor: &PageCursor) -> OrderKey {
    (Reverse(cursor.created_at), Reverse(cursor.video_id.clone()))
}

#[derive(Default)]
struct Tables {
    rows: HashMap<String, VideoRecord>,
    by_user: HashMap<String, BTreeSet<OrderKey>>,
    by_status: HashMap<VideoStatus, BTreeSet<OrderKey>>,
    by_created_at: BTreeSet<OrderKey>,
}

impl Tables {
    fn insert(&mut self, record: VideoRecord) {
        let key = order_key(&record);
        self.by_user.entry(record.user_id.clone()).or_default().insert(key.clone());
        self.by_status.entry(record.status).or_default().insert(key.clone());
        self.by_created_at.insert(key);
        self.rows.insert(record.video_id.clone(), record);
    }

    /// The only path that modifies an existing row
    ///
    /// Keeps the status index in step and stamps `updated_at` so it moves
    /// forward on every write.
    fn mutate<F>(&mut self, video_id: &str, change: F) -> StoreResult<VideoRecord>
    where
        F: FnOnce(&mut VideoRecord),
    {
        let record = self
            .rows
            .get_mut(video_id)
            .ok_or_else(|| StoreError::NotFound(video_id.to_string()))?;

        let previous_status = record.status;
        change(record);
        record.updated_at = next_stamp(record.updated_at);

        if record.status != previous_status {
            let key = order_key(record);
            if let Some(keys) = self.by_status.get_mut(&previous_status) {
                keys.remove(&key);
            }
            self.by_status.entry(record.status).or_default().insert(key);
        }

        Ok(record.clone())
    }

    fn page(&self, keys: Option<&BTreeSet<OrderKey>>, after: Option<&PageCursor>, limit: usize) -> VideoPage {
        let Some(keys) = keys else {
            return VideoPage::default();
        };
        if limit == 0 {
            return VideoPage::default();
        }

        let lower = match after {
            Some(cursor) => Bound::Excluded(cursor_key(cursor)),
            None => Bound::Unbounded,
        };

        let rows = keys
            .range((lower, Bound::Unbounded))
            .take(limit + 1)
            .filter_map(|(_, Reverse(video_id))| self.rows.get(video_id).cloned())
            .collect();

        VideoPage::from_overfetch(rows, limit)
    }
}

/// Current time at the precision the relational backend stores
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn next_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    now().max(previous + Duration::microseconds(1))
}

/// [`VideoStore`] backed by process memory
///
/// Readers share the lock; a write waits for in-flight reads to finish.
#[derive(Default)]
pub struct MemoryVideoStore {
    tables: RwLock<Tables>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    #[tracing::instrument(skip(self, video), fields(video_id = %video.video_id, user_id = %video.user_id))]
    async fn create(&self, video: NewVideo) -> StoreResult<VideoRecord> {
        video.validate()?;

        let mut tables = self.tables.write().await;
        if tables.rows.contains_key(&video.video_id) {
            return Err(StoreError::DuplicateKey(video.video_id));
        }

        let at = now();
        let record = VideoRecord {
            video_id: video.video_id,
            user_id: video.user_id,
            filename: video.filename,
            storage_key: video.storage_key,
            status: VideoStatus::default(),
            created_at: at,
            updated_at: at,
        };
        tables.insert(record.clone());

        Ok(record)
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(&self, video_id: &str, status: VideoStatus) -> StoreResult<VideoRecord> {
        self.tables
            .write()
            .await
            .mutate(video_id, |record| record.status = status)
    }

    async fn get(&self, video_id: &str) -> StoreResult<VideoRecord> {
        self.tables
            .read()
            .await
            .rows
            .get(video_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(video_id.to_string()))
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> StoreResult<VideoPage> {
        let tables = self.tables.read().await;
        Ok(tables.page(tables.by_user.get(user_id), after, limit))
    }

    async fn list_by_status(
        &self,
        status: VideoStatus,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> StoreResult<VideoPage> {
        let tables = self.tables.read().await;
        Ok(tables.page(tables.by_status.get(&status), after, limit))
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<VideoRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_created_at
            .iter()
            .take(limit)
            .filter_map(|(_, Reverse(video_id))| tables.rows.get(video_id).cloned())
            .collect())
    }

    async fn list(&self, filter: &VideoFilter) -> StoreResult<Vec<VideoRecord>> {
        let tables = self.tables.read().await;

        // Walk the narrowest ordering available, check the rest per row
        let keys = match (&filter.user_id, filter.status) {
            (Some(user_id), _) => tables.by_user.get(user_id),
            (None, Some(status)) => tables.by_status.get(&status),
            (None, None) => Some(&tables.by_created_at),
        };
        let Some(keys) = keys else {
            return Ok(Vec::new());
        };

        Ok(keys
            .iter()
            .filter_map(|(_, Reverse(video_id))| tables.rows.get(video_id))
            .filter(|record| filter.status.map_or(true, |status| record.status == status))
            .take(filter.effective_limit())
            .cloned()
            .collect())
    }

    async fn count_by_status(&self, user_id: Option<&str>) -> StoreResult<StatusCounts> {
        let tables = self.tables.read().await;
        let mut counts = StatusCounts::new();

        for record in tables.rows.values() {
            if user_id.map_or(true, |user_id| record.user_id == user_id) {
                *counts.entry(record.status).or_insert(0) += 1;
            }
        }

        Ok(counts)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
