//! End-to-end HTTP tests against the in-memory store

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vistela_server::api::{create_router, AppState};
use vistela_server::config::Config;
use vistela_server::db::MemoryVideoStore;
use vistela_server::storage::{MemoryObjectStorage, SharedObjectStorage};

fn app() -> Router {
    let state = AppState {
        store: Arc::new(MemoryVideoStore::new()),
        storage: None,
    };
    create_router(state, &Config::default().cors)
}

fn app_with_objects(objects: Arc<MemoryObjectStorage>) -> Router {
    let state = AppState {
        store: Arc::new(MemoryVideoStore::new()),
        storage: Some(objects as SharedObjectStorage),
    };
    create_router(state, &Config::default().cors)
}

const BOUNDARY: &str = "vistela-test-boundary";

fn text_part(name: &str, value: &str) -> String {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
        BOUNDARY, name, value
    )
}

async fn upload(app: &Router, fields: &[(&str, &str)], filename: &str, content: &[u8]) -> (StatusCode, Value) {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(text_part(name, value).as_bytes());
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: video/mp4\r\n\r\n",
            BOUNDARY, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/videos/upload")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        },
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create(app: &Router, video_id: &str, user_id: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/v1/videos",
        Some(json!({
            "video_id": video_id,
            "user_id": user_id,
            "filename": "a.mp4",
            "storage_key": format!("videos/{}/{}/a.mp4", user_id, video_id),
        })),
    )
    .await
}

#[tokio::test]
async fn create_returns_pending_record() {
    let app = app();

    let (status, body) = create(&app, "v1", "u1").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["video_id"], "v1");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["created_at"], body["data"]["updated_at"]);
}

#[tokio::test]
async fn create_accepts_s3_key_alias() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/videos",
        Some(json!({
            "video_id": "v1",
            "user_id": "u1",
            "filename": "a.mp4",
            "s3_key": "videos/u1/v1/a.mp4",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["storage_key"], "videos/u1/v1/a.mp4");
}

#[tokio::test]
async fn duplicate_create_conflicts() {
    let app = app();
    create(&app, "v1", "u1").await;

    let (status, body) = create(&app, "v1", "u2").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, fetched) = send(&app, "GET", "/api/v1/videos/v1", None).await;
    assert_eq!(fetched["data"]["user_id"], "u1");
}

#[tokio::test]
async fn oversized_fields_are_rejected() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/videos",
        Some(json!({
            "video_id": "v1",
            "user_id": "u1",
            "filename": "f".repeat(501),
            "storage_key": "videos/u1/v1/a.mp4",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, "GET", "/api/v1/videos/v1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_missing_video_is_not_found() {
    let (status, body) = send(&app(), "GET", "/api/v1/videos/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn update_status_flow() {
    let app = app();
    let (_, created) = create(&app, "v1", "u1").await;
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/videos/v1/status",
        Some(json!({ "status": "processing" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "processing");
    assert_eq!(body["data"]["created_at"], created["data"]["created_at"]);
    assert_ne!(body["data"]["updated_at"], created["data"]["updated_at"]);

    let (_, page) = send(&app, "GET", "/api/v1/users/u1/videos", None).await;
    assert_eq!(page["data"]["items"][0]["status"], "processing");
    assert_eq!(page["data"]["pagination"]["count"], 1);
}

#[tokio::test]
async fn update_status_rejects_unknown_label() {
    let app = app();
    create(&app, "v1", "u1").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/videos/v1/status",
        Some(json!({ "status": "archived" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, fetched) = send(&app, "GET", "/api/v1/videos/v1", None).await;
    assert_eq!(fetched["data"]["status"], "pending");
}

#[tokio::test]
async fn update_status_of_missing_video_is_not_found() {
    let (status, _) = send(
        &app(),
        "PUT",
        "/api/v1/videos/ghost/status",
        Some(json!({ "status": "ready" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_pages_follow_cursor() {
    let app = app();
    for i in 0..5 {
        create(&app, &format!("v{}", i), "u1").await;
    }
    create(&app, "other", "u2").await;

    let mut seen = Vec::new();
    let mut uri = "/api/v1/users/u1/videos?limit=2".to_string();
    loop {
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        for item in body["data"]["items"].as_array().unwrap() {
            assert_eq!(item["user_id"], "u1");
            seen.push(item["video_id"].as_str().unwrap().to_string());
        }

        match body["data"]["pagination"]["next_cursor"].as_str() {
            Some(cursor) => uri = format!("/api/v1/users/u1/videos?limit=2&cursor={}", cursor),
            None => break,
        }
    }

    assert_eq!(seen.len(), 5);
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);
}

#[tokio::test]
async fn malformed_cursor_is_rejected() {
    let (status, body) = send(&app(), "GET", "/api/v1/users/u1/videos?cursor=x", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn status_listing_and_filters() {
    let app = app();
    create(&app, "v1", "u1").await;
    create(&app, "v2", "u1").await;
    create(&app, "v3", "u2").await;
    send(&app, "PUT", "/api/v1/videos/v2/status", Some(json!({ "status": "failed" }))).await;

    let (status, body) = send(&app, "GET", "/api/v1/statuses/failed/videos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["video_id"], "v2");
    assert_eq!(body["data"]["pagination"]["count"], 1);

    let (status, _) = send(&app, "GET", "/api/v1/statuses/archived/videos", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/v1/videos?user_id=u1&status=pending", None).await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["items"][0]["video_id"], "v1");

    let (_, body) = send(&app, "GET", "/api/v1/videos?limit=2", None).await;
    assert_eq!(body["data"]["count"], 2);
}

#[tokio::test]
async fn stats_fill_every_status() {
    let app = app();
    create(&app, "v1", "u1").await;
    create(&app, "v2", "u1").await;
    create(&app, "v3", "u2").await;
    send(&app, "PUT", "/api/v1/videos/v1/status", Some(json!({ "status": "ready" }))).await;

    let (status, body) = send(&app, "GET", "/api/v1/videos/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["by_status"]["pending"], 2);
    assert_eq!(body["data"]["by_status"]["ready"], 1);
    assert_eq!(body["data"]["by_status"]["failed"], 0);

    let (_, body) = send(&app, "GET", "/api/v1/videos/stats?user_id=u2", None).await;
    assert_eq!(body["data"]["user_id"], "u2");
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["by_status"]["pending"], 1);
}

#[tokio::test]
async fn create_with_missing_field_is_validation_error() {
    let (status, body) = send(
        &app(),
        "POST",
        "/api/v1/videos",
        Some(json!({ "video_id": "v1", "filename": "a.mp4", "storage_key": "k" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("user_id"));
}

#[tokio::test]
async fn non_json_body_is_validation_error() {
    let request = Request::builder()
        .method("PUT")
        .uri("/api/v1/videos/v1/status")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn bad_limit_is_validation_error() {
    let (status, body) = send(&app(), "GET", "/api/v1/users/u1/videos?limit=lots", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn upload_registers_pending_record() {
    let objects = Arc::new(MemoryObjectStorage::default());
    let app = app_with_objects(Arc::clone(&objects));

    let (status, body) = upload(&app, &[("user_id", "u1"), ("video_id", "v1")], "a.mp4", b"mp4 bytes").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["video"]["status"], "pending");
    assert_eq!(body["data"]["video"]["storage_key"], "videos/u1/v1/a.mp4");
    assert_eq!(body["data"]["size"], 9);
    assert_eq!(objects.get("videos/u1/v1/a.mp4").await.unwrap().data, b"mp4 bytes");

    let (status, fetched) = send(&app, "GET", "/api/v1/videos/v1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["filename"], "a.mp4");
}

#[tokio::test]
async fn repeat_upload_conflicts_and_keeps_original() {
    let objects = Arc::new(MemoryObjectStorage::default());
    let app = app_with_objects(Arc::clone(&objects));
    let fields = [("user_id", "u1"), ("video_id", "v1")];
    upload(&app, &fields, "a.mp4", b"original").await;

    let (status, body) = upload(&app, &fields, "a.mp4", b"replacement").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = upload(&app, &fields, "b.mp4", b"other").await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(objects.keys().await, vec!["videos/u1/v1/a.mp4".to_string()]);
    assert_eq!(objects.get("videos/u1/v1/a.mp4").await.unwrap().data, b"original");

    let (status, fetched) = send(&app, "GET", "/api/v1/videos/v1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["storage_key"], "videos/u1/v1/a.mp4");
}

#[tokio::test]
async fn upload_with_unreachable_storage_is_unavailable() {
    let objects = Arc::new(MemoryObjectStorage::default());
    objects.set_unavailable(true);
    let app = app_with_objects(Arc::clone(&objects));

    let (status, body) = upload(&app, &[("user_id", "u1"), ("video_id", "v1")], "a.mp4", b"data").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "OBJECT_STORAGE_UNAVAILABLE");

    let (status, _) = send(&app, "GET", "/api/v1/videos/v1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
