//! Behavior every `VideoStore` backend must share
//!
//! Each check takes a fresh, empty store. Backend test files call them
//! one per test so failures point at the backend.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use vistela_common::VideoStatus;
use vistela_server::db::videos::{stream_by_status, stream_by_user};
use vistela_server::db::{NewVideo, SharedVideoStore, VideoFilter, VideoRecord};
use vistela_server::StoreError;

pub fn new_video(video_id: &str, user_id: &str) -> NewVideo {
    NewVideo::new(
        video_id,
        user_id,
        "a.mp4",
        format!("videos/{}/{}/a.mp4", user_id, video_id),
    )
}

/// Short pause so consecutive writes land on distinct timestamps
pub async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

fn ids(records: &[VideoRecord]) -> Vec<&str> {
    records.iter().map(|r| r.video_id.as_str()).collect()
}

fn assert_descending(records: &[VideoRecord]) {
    for pair in records.windows(2) {
        let key = |r: &VideoRecord| (r.created_at, r.video_id.clone());
        assert!(key(&pair[0]) > key(&pair[1]), "{:?} before {:?}", key(&pair[0]), key(&pair[1]));
    }
}

pub async fn create_then_get(store: SharedVideoStore) {
    let created = store.create(new_video("v1", "u1")).await.unwrap();

    assert_eq!(created.status, VideoStatus::Pending);
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(created.storage_key, "videos/u1/v1/a.mp4");
    assert_eq!(store.get("v1").await.unwrap(), created);
}

pub async fn duplicate_create_is_rejected(store: SharedVideoStore) {
    let original = store.create(new_video("v1", "u1")).await.unwrap();

    let err = store.create(new_video("v1", "u2")).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(ref id) if id == "v1"), "{:?}", err);
    assert_eq!(store.get("v1").await.unwrap(), original);
}

pub async fn concurrent_duplicate_creates_admit_one(store: SharedVideoStore) {
    let attempts: Vec<_> = (0..6)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.create(new_video("race", &format!("u{}", i))).await })
        })
        .collect();

    let mut winners = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => winners += 1,
            Err(StoreError::DuplicateKey(_)) => {},
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(store.list_recent(10).await.unwrap().len(), 1);
}

pub async fn invalid_fields_are_rejected(store: SharedVideoStore) {
    let mut video = new_video("v1", "u1");
    video.storage_key = "k".repeat(1001);
    assert!(matches!(store.create(video).await, Err(StoreError::Validation(_))));

    let mut video = new_video("v1", "u1");
    video.user_id = String::new();
    assert!(matches!(store.create(video).await, Err(StoreError::Validation(_))));

    assert!(matches!(store.get("v1").await, Err(StoreError::NotFound(_))));
}

pub async fn update_refreshes_updated_at(store: SharedVideoStore) {
    let created = store.create(new_video("v1", "u1")).await.unwrap();
    tick().await;

    let updated = store.update_status("v1", VideoStatus::Processing).await.unwrap();
    assert_eq!(updated.status, VideoStatus::Processing);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
    tick().await;

    // Same status again still counts as a write
    let again = store.update_status("v1", VideoStatus::Processing).await.unwrap();
    assert!(again.updated_at > updated.updated_at);
    assert_eq!(store.get("v1").await.unwrap(), again);
}

pub async fn update_of_missing_video_creates_nothing(store: SharedVideoStore) {
    let err = store.update_status("ghost", VideoStatus::Ready).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref id) if id == "ghost"), "{:?}", err);
    assert!(matches!(store.get("ghost").await, Err(StoreError::NotFound(_))));
    assert!(store.list_recent(10).await.unwrap().is_empty());
}

pub async fn upload_lifecycle_example(store: SharedVideoStore) {
    store
        .create(NewVideo::new("v1", "u1", "lecture.mp4", "s3://bucket/v1"))
        .await
        .unwrap();
    let fetched = store.get("v1").await.unwrap();
    assert_eq!(fetched.status, VideoStatus::Pending);
    assert_eq!(fetched.user_id, "u1");
    assert_eq!(fetched.filename, "lecture.mp4");
    tick().await;

    let processing = store.update_status("v1", VideoStatus::Processing).await.unwrap();
    tick().await;
    let ready = store.update_status("v1", VideoStatus::Ready).await.unwrap();
    assert!(processing.updated_at > fetched.updated_at);
    assert!(ready.updated_at > processing.updated_at);

    let page = store.list_by_user("u1", None, 10).await.unwrap();
    assert_eq!(page.items, vec![ready]);
    assert!(page.next_cursor.is_none());
}

pub async fn list_by_user_pages_newest_first(store: SharedVideoStore) {
    for i in 0..5 {
        store.create(new_video(&format!("v{}", i), "u1")).await.unwrap();
        tick().await;
    }
    store.create(new_video("other", "u2")).await.unwrap();

    let first = store.list_by_user("u1", None, 2).await.unwrap();
    assert_eq!(ids(&first.items), ["v4", "v3"]);

    let second = store.list_by_user("u1", first.next_cursor.as_ref(), 2).await.unwrap();
    assert_eq!(ids(&second.items), ["v2", "v1"]);

    let third = store.list_by_user("u1", second.next_cursor.as_ref(), 2).await.unwrap();
    assert_eq!(ids(&third.items), ["v0"]);
    assert!(third.next_cursor.is_none());
}

pub async fn paging_survives_concurrent_inserts(store: SharedVideoStore) {
    for i in 0..4 {
        store.create(new_video(&format!("v{}", i), "u1")).await.unwrap();
    }

    let first = store.list_by_user("u1", None, 2).await.unwrap();
    store.create(new_video("late", "u1")).await.unwrap();
    let rest = store.list_by_user("u1", first.next_cursor.as_ref(), 10).await.unwrap();

    let mut seen: Vec<&str> = ids(&first.items);
    seen.extend(ids(&rest.items));
    let before = seen.len();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), before, "a record appeared on two pages");
    assert!(!seen.contains(&"late"));
}

pub async fn list_by_status_tracks_updates(store: SharedVideoStore) {
    store.create(new_video("v1", "u1")).await.unwrap();
    store.create(new_video("v2", "u2")).await.unwrap();
    store.update_status("v1", VideoStatus::Failed).await.unwrap();

    let failed = store.list_by_status(VideoStatus::Failed, None, 10).await.unwrap();
    assert_eq!(ids(&failed.items), ["v1"]);

    let pending = store.list_by_status(VideoStatus::Pending, None, 10).await.unwrap();
    assert_eq!(ids(&pending.items), ["v2"]);

    let ready = store.list_by_status(VideoStatus::Ready, None, 10).await.unwrap();
    assert!(ready.items.is_empty());
}

pub async fn list_recent_orders_and_prefixes(store: SharedVideoStore) {
    for i in 0..6 {
        store.create(new_video(&format!("v{}", i), &format!("u{}", i % 3))).await.unwrap();
    }

    let all = store.list_recent(6).await.unwrap();
    assert_eq!(all.len(), 6);
    assert_descending(&all);

    let top = store.list_recent(4).await.unwrap();
    assert_eq!(top.as_slice(), &all[..4]);

    assert!(store.list_recent(0).await.unwrap().is_empty());
}

pub async fn list_filters_combine(store: SharedVideoStore) {
    store.create(new_video("v1", "u1")).await.unwrap();
    store.create(new_video("v2", "u1")).await.unwrap();
    store.create(new_video("v3", "u2")).await.unwrap();
    store.update_status("v2", VideoStatus::Completed).await.unwrap();
    store.update_status("v3", VideoStatus::Completed).await.unwrap();

    let both = store
        .list(&VideoFilter::default().for_user("u1").with_status(VideoStatus::Completed))
        .await
        .unwrap();
    assert_eq!(ids(&both), ["v2"]);

    let by_status = store
        .list(&VideoFilter::default().with_status(VideoStatus::Completed))
        .await
        .unwrap();
    assert_eq!(by_status.len(), 2);
    assert_descending(&by_status);

    let limited = store.list(&VideoFilter::default().with_limit(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
}

pub async fn count_by_status_groups(store: SharedVideoStore) {
    store.create(new_video("v1", "u1")).await.unwrap();
    store.create(new_video("v2", "u1")).await.unwrap();
    store.create(new_video("v3", "u2")).await.unwrap();
    store.update_status("v3", VideoStatus::Ready).await.unwrap();

    let all = store.count_by_status(None).await.unwrap();
    assert_eq!(all.get(&VideoStatus::Pending), Some(&2));
    assert_eq!(all.get(&VideoStatus::Ready), Some(&1));

    let u2 = store.count_by_status(Some("u2")).await.unwrap();
    assert_eq!(u2.get(&VideoStatus::Pending), None);
    assert_eq!(u2.get(&VideoStatus::Ready), Some(&1));
}

pub async fn streams_walk_every_page(store: SharedVideoStore) {
    for i in 0..7 {
        store.create(new_video(&format!("v{}", i), "u1")).await.unwrap();
    }

    let by_user: Vec<VideoRecord> = stream_by_user(Arc::clone(&store), "u1", None, 3)
        .map(|r| r.unwrap())
        .collect()
        .await;
    assert_eq!(by_user.len(), 7);
    assert_descending(&by_user);

    let by_status: Vec<VideoRecord> = stream_by_status(Arc::clone(&store), VideoStatus::Pending, None, 2)
        .map(|r| r.unwrap())
        .collect()
        .await;
    assert_eq!(by_status, by_user);
}

pub async fn ping_succeeds(store: SharedVideoStore) {
    store.ping().await.unwrap();
}
