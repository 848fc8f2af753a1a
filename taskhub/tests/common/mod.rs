#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use taskhub::api::health::ReadyCheck;
use taskhub::api::{HttpTimeouts, app_router};
use taskhub::service::task::TaskService;
use taskhub::storage::TaskStorage;
use taskhub::storage::driver::memory::MemoryTaskStorage;
use taskhub::storage::driver::sqlite::{self, SqliteTaskStorage};
use taskhub::utils::state::AppState;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("invalid json ({e}): {:?}", self.body))
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }

    pub fn request_id(&self) -> &str {
        self.headers["x-request-id"].to_str().unwrap()
    }
}

pub fn app_with(
    storage: Arc<dyn TaskStorage>,
    ready_check: Option<Arc<dyn ReadyCheck>>,
) -> Router {
    let state = Arc::new(AppState::new(TaskService::new(storage), ready_check));
    app_router(state, HttpTimeouts::default())
}

pub fn memory_app() -> Router {
    app_with(Arc::new(MemoryTaskStorage::new()), None)
}

/// Single connection so every query sees the same in-memory database.
pub async fn sqlite_storage() -> SqliteTaskStorage {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlite::migrate(&pool).await.unwrap();
    SqliteTaskStorage::new(pool)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    request_id: Option<&str>,
    body: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = request_id {
        builder = builder.header("X-Request-ID", id);
    }
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_owned())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        headers,
        body,
    }
}
