//! Shared pagination utilities
//!
//! Two shapes are used by the video queries:
//!
//! - [`CursorParams`]: keyset pages over one user or one status, continued
//!   with an opaque `cursor` token
//! - [`ListLimit`]: a single bounded listing (`limit` only)
//!
//! # Examples
//!
//! ```rust,ignore
//! use vistela_server::features::shared::pagination::CursorParams;
//!
//! let params = CursorParams::new(None, Some(50));
//! let page = store.list_by_user("u1", params.after()?.as_ref(), params.limit()).await?;
//! let next = CursorParams::new(page.next_cursor.map(|c| c.encode()), Some(50));
//! ```

use serde::{Deserialize, Serialize};

use crate::db::videos::{InvalidCursorError, PageCursor, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

/// Default page size for keyset pages
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page size for keyset pages
pub const MAX_PAGE_SIZE: i64 = 100;

/// Keyset page request parameters
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CursorParams {
    /// Token from a previous page's `next_cursor`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Items per page. Defaults to 20, clamped to 1-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl CursorParams {
    pub fn new(cursor: Option<String>, limit: Option<i64>) -> Self {
        Self { cursor, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) as usize
    }

    /// Decoded cursor; an absent or blank token starts from the newest record
    pub fn after(&self) -> Result<Option<PageCursor>, InvalidCursorError> {
        match self.cursor.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(token) => PageCursor::decode(token).map(Some),
        }
    }
}

/// Bounded listing parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ListLimit(pub Option<i64>);

impl ListLimit {
    /// Defaults to 100, clamped to 1-1000
    pub fn get(self) -> usize {
        self.0
            .unwrap_or(DEFAULT_LIST_LIMIT as i64)
            .clamp(1, MAX_LIST_LIMIT as i64) as usize
    }
}

/// Keyset page metadata returned alongside items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorMetadata {
    pub count: usize,
    /// Pass back as `cursor` to fetch the next page; absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl CursorMetadata {
    pub fn new(count: usize, next: Option<&PageCursor>) -> Self {
        Self {
            count,
            next_cursor: next.map(PageCursor::encode),
        }
    }
}
