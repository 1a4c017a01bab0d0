//! PostgreSQL [`VideoStore`]
//!
//! `updated_at` is maintained by the `update_videos_updated_at` trigger, so
//! writes here never set it. Timestamps are `TIMESTAMP` columns read as UTC;
//! see [`super::create_pool`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use vistela_common::VideoStatus;

use super::videos::{
    parse_status, NewVideo, PageCursor, StatusCounts, VideoFilter, VideoPage, VideoRecord, VideoStore,
};
use super::{is_unique_violation, StoreError, StoreResult};

const COLUMNS: &str = "video_id, user_id, filename, s3_key, status, created_at, updated_at";

#[derive(Debug, FromRow)]
struct VideoRow {
    video_id: String,
    user_id: String,
    filename: String,
    s3_key: String,
    status: String,
    created_at: Option<NaiveDateTime>,
    updated_at: Option<NaiveDateTime>,
}

impl TryFrom<VideoRow> for VideoRecord {
    type Error = StoreError;

    fn try_from(row: VideoRow) -> StoreResult<Self> {
        let status = parse_status(&row.video_id, &row.status)?;
        let created_at = row.created_at.ok_or_else(|| {
            StoreError::validation(format!("Video '{}' has no created_at", row.video_id))
        })?;
        let updated_at = row.updated_at.unwrap_or(created_at);

        Ok(VideoRecord {
            video_id: row.video_id,
            user_id: row.user_id,
            filename: row.filename,
            storage_key: row.s3_key,
            status,
            created_at: DateTime::from_naive_utc_and_offset(created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(updated_at, Utc),
        })
    }
}

fn into_records(rows: Vec<VideoRow>) -> StoreResult<Vec<VideoRecord>> {
    rows.into_iter().map(VideoRecord::try_from).collect()
}

/// Clamp a limit to what `LIMIT` accepts
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// [`VideoStore`] over the `videos` table
#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Keyset page over rows matching `column = value`
    async fn page_where(
        &self,
        column: &'static str,
        value: String,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> StoreResult<VideoPage> {
        if limit == 0 {
            return Ok(VideoPage::default());
        }

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM videos WHERE ", COLUMNS));
        query.push(column).push(" = ").push_bind(value);

        if let Some(cursor) = after {
            query
                .push(" AND (created_at, video_id) < (")
                .push_bind(cursor.created_at.naive_utc())
                .push(", ")
                .push_bind(cursor.video_id.clone())
                .push(")");
        }

        query
            .push(" ORDER BY created_at DESC, video_id DESC LIMIT ")
            .push_bind(sql_limit(limit.saturating_add(1)));

        let rows = query.build_query_as::<VideoRow>().fetch_all(&self.pool).await?;
        Ok(VideoPage::from_overfetch(into_records(rows)?, limit))
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    #[tracing::instrument(skip(self, video), fields(video_id = %video.video_id, user_id = %video.user_id))]
    async fn create(&self, video: NewVideo) -> StoreResult<VideoRecord> {
        video.validate()?;

        let row = sqlx::query_as::<_, VideoRow>(&format!(
            "INSERT INTO videos (video_id, user_id, filename, s3_key) VALUES ($1, $2, $3, $4) RETURNING {}",
            COLUMNS
        ))
        .bind(&video.video_id)
        .bind(&video.user_id)
        .bind(&video.filename)
        .bind(&video.storage_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateKey(video.video_id.clone())
            } else {
                StoreError::from(e)
            }
        })?;

        VideoRecord::try_from(row)
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(&self, video_id: &str, status: VideoStatus) -> StoreResult<VideoRecord> {
        let row = sqlx::query_as::<_, VideoRow>(&format!(
            "UPDATE videos SET status = $2 WHERE video_id = $1 RETURNING {}",
            COLUMNS
        ))
        .bind(video_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(video_id.to_string()))?;

        VideoRecord::try_from(row)
    }

    async fn get(&self, video_id: &str) -> StoreResult<VideoRecord> {
        let row = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE video_id = $1",
            COLUMNS
        ))
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(video_id.to_string()))?;

        VideoRecord::try_from(row)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> StoreResult<VideoPage> {
        self.page_where("user_id", user_id.to_string(), after, limit).await
    }

    async fn list_by_status(
        &self,
        status: VideoStatus,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> StoreResult<VideoPage> {
        self.page_where("status", status.as_str().to_string(), after, limit).await
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<VideoRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {} FROM videos ORDER BY created_at DESC, video_id DESC LIMIT $1",
            COLUMNS
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    async fn list(&self, filter: &VideoFilter) -> StoreResult<Vec<VideoRecord>> {
        let limit = filter.effective_limit();
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM videos WHERE TRUE", COLUMNS));
        if let Some(user_id) = &filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query
            .push(" ORDER BY created_at DESC, video_id DESC LIMIT ")
            .push_bind(sql_limit(limit));

        let rows = query.build_query_as::<VideoRow>().fetch_all(&self.pool).await?;
        into_records(rows)
    }

    async fn count_by_status(&self, user_id: Option<&str>) -> StoreResult<StatusCounts> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM videos WHERE ($1::varchar IS NULL OR user_id = $1) GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::new();
        for (label, count) in rows {
            match label.parse::<VideoStatus>() {
                Ok(status) => {
                    counts.insert(status, count);
                },
                Err(_) => {
                    tracing::warn!(status = %label, count, "Skipping unknown status in counts");
                },
            }
        }

        Ok(counts)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
