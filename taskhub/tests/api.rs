mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use rstest::rstest;
use tower::ServiceExt;

use common::{TestResponse, app_with, memory_app, send, sqlite_storage};
use taskhub::api::health::ReadyCheck;
use taskhub::domain::task::Task;
use taskhub::error::{AppError, Result};
use taskhub::storage::TaskStorage;

fn assert_error(response: &TestResponse, status: StatusCode, code: &str) {
    assert_eq!(response.status, status, "{}", response.text());
    let body = response.json();
    assert_eq!(body["code"], code);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert_eq!(body["request_id"], response.request_id());
}

async fn create_get_patch_scenario(app: axum::Router) {
    let created = send(&app, Method::POST, "/tasks", None, Some(r#"{"title":"buy milk"}"#)).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let task = created.json();
    assert_eq!(task["title"], "buy milk");
    assert_eq!(task["done"], false);
    let id = task["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert!(DateTime::parse_from_rfc3339(task["create_at"].as_str().unwrap()).is_ok());

    let fetched = send(&app, Method::GET, &format!("/tasks/{id}"), None, None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json(), task);

    let patched = send(&app, Method::PATCH, &format!("/tasks/{id}"), None, Some(r#"{"done":true}"#)).await;
    assert_eq!(patched.status, StatusCode::OK);
    let patched = patched.json();
    assert_eq!(patched["done"], true);
    assert_eq!(patched["id"], task["id"]);
    assert_eq!(patched["title"], task["title"]);
    assert_eq!(patched["create_at"], task["create_at"]);
}

#[tokio::test]
async fn create_get_patch_against_memory() {
    create_get_patch_scenario(memory_app()).await;
}

#[tokio::test]
async fn create_get_patch_against_sqlite() {
    create_get_patch_scenario(app_with(Arc::new(sqlite_storage().await), None)).await;
}

#[tokio::test]
async fn list_returns_tasks_in_creation_order() {
    let app = memory_app();
    let empty = send(&app, Method::GET, "/tasks", None, None).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.json(), serde_json::json!([]));

    for title in ["first", "second", "third"] {
        let body = format!(r#"{{"title":"{title}"}}"#);
        send(&app, Method::POST, "/tasks", None, Some(&body)).await;
    }

    let listed = send(&app, Method::GET, "/tasks", None, None).await;
    assert_eq!(listed.status, StatusCode::OK);
    let titles: Vec<_> = listed
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn error_body_carries_the_inbound_request_id() {
    let app = memory_app();
    let response = send(&app, Method::POST, "/tasks", Some("abc123"), Some("{not json")).await;

    assert_error(&response, StatusCode::BAD_REQUEST, "INVALID_JSON");
    assert_eq!(response.request_id(), "abc123");
    assert_eq!(response.json()["request_id"], "abc123");
}

#[rstest]
#[case::empty_title(r#"{"title":""}"#.to_string())]
#[case::blank_title(r#"{"title":"   "}"#.to_string())]
#[case::missing_title("{}".to_string())]
#[case::too_long(format!(r#"{{"title":"{}"}}"#, "x".repeat(201)))]
#[tokio::test]
async fn invalid_titles_are_rejected(#[case] body: String) {
    let app = memory_app();
    let response = send(&app, Method::POST, "/tasks", None, Some(&body)).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "INVALID_ARGUMENT");

    let listed = send(&app, Method::GET, "/tasks", None, None).await;
    assert_eq!(listed.json(), serde_json::json!([]));
}

#[tokio::test]
async fn wrong_json_type_is_invalid_json() {
    let app = memory_app();
    let response = send(&app, Method::POST, "/tasks", None, Some(r#"{"title":42}"#)).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "INVALID_JSON");
}

#[rstest]
#[case(Method::POST, "/tasks")]
#[case(Method::PATCH, "/tasks/any")]
#[tokio::test]
async fn oversized_body_is_a_json_error(#[case] method: Method, #[case] uri: &str) {
    let app = memory_app();
    let body = format!(r#"{{"title":"{}"}}"#, "x".repeat(3 * 1024 * 1024));
    let response = send(&app, method, uri, Some("rid-big"), Some(&body)).await;

    assert_error(&response, StatusCode::BAD_REQUEST, "INVALID_JSON");
    assert_eq!(response.json()["request_id"], "rid-big");
    assert_eq!(response.headers["content-type"], "application/json");
}

#[tokio::test(start_paused = true)]
async fn stalled_body_times_out_as_a_json_error() {
    let stalled = futures::stream::pending::<std::result::Result<Bytes, std::io::Error>>();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tasks")
        .header("X-Request-ID", "rid-slow-body")
        .header("content-type", "application/json")
        .body(Body::from_stream(stalled))
        .unwrap();

    let response = memory_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], "INVALID_JSON");
    assert_eq!(body["request_id"], "rid-slow-body");
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let app = memory_app();
    let response = send(&app, Method::GET, "/tasks/does-not-exist", None, None).await;
    assert_error(&response, StatusCode::NOT_FOUND, "NOT_FOUND");
    assert_eq!(response.request_id().len(), 32);

    let response = send(&app, Method::PATCH, "/tasks/does-not-exist", None, Some(r#"{"done":true}"#)).await;
    assert_error(&response, StatusCode::NOT_FOUND, "NOT_FOUND");
}

#[tokio::test]
async fn patch_with_bad_json_is_rejected_before_lookup() {
    let app = memory_app();
    let response = send(&app, Method::PATCH, "/tasks/does-not-exist", None, Some("done")).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "INVALID_JSON");
}

#[rstest]
#[case(Method::DELETE, "/tasks")]
#[case(Method::PUT, "/tasks")]
#[case(Method::DELETE, "/tasks/abc")]
#[case(Method::POST, "/tasks/abc")]
#[case(Method::POST, "/healthz")]
#[tokio::test]
async fn unsupported_methods_get_405_with_empty_body(#[case] method: Method, #[case] uri: &str) {
    let response = send(&memory_app(), method, uri, Some("rid-405"), None).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.body.is_empty());
    assert_eq!(response.request_id(), "rid-405");
}

#[rstest]
#[case("/tasks/")]
#[case("/tasks/abc/done")]
#[case("/nope")]
#[tokio::test]
async fn unknown_paths_are_404(#[case] uri: &str) {
    let response = send(&memory_app(), Method::GET, uri, Some("rid-404"), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.request_id(), "rid-404");
}

#[tokio::test]
async fn healthz_is_always_ok() {
    let response = send(&memory_app(), Method::GET, "/healthz", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ok");
    assert!(
        response.headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}

struct StaticProbe(bool);

#[async_trait::async_trait]
impl ReadyCheck for StaticProbe {
    async fn ready(&self) -> Result<()> {
        if self.0 {
            Ok(())
        } else {
            Err(AppError::Internal("database unreachable".into()))
        }
    }
}

struct SlowProbe;

#[async_trait::async_trait]
impl ReadyCheck for SlowProbe {
    async fn ready(&self) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

fn app_with_probe(probe: impl ReadyCheck + 'static) -> axum::Router {
    app_with(
        Arc::new(taskhub::storage::driver::memory::MemoryTaskStorage::new()),
        Some(Arc::new(probe)),
    )
}

#[tokio::test]
async fn readyz_without_probe_is_ok() {
    let response = send(&memory_app(), Method::GET, "/readyz", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn readyz_follows_the_probe() {
    let ok = send(&app_with_probe(StaticProbe(true)), Method::GET, "/readyz", None, None).await;
    assert_eq!(ok.status, StatusCode::OK);

    let failing = send(&app_with_probe(StaticProbe(false)), Method::GET, "/readyz", None, None).await;
    assert_eq!(failing.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(failing.text(), "not ready");
}

#[tokio::test(start_paused = true)]
async fn readyz_gives_up_on_a_slow_probe() {
    let response = send(&app_with_probe(SlowProbe), Method::GET, "/readyz", None, None).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.text(), "not ready");
}

#[tokio::test]
async fn readyz_pings_sqlite() {
    let storage = Arc::new(sqlite_storage().await);
    let app = app_with(storage.clone(), Some(storage.clone()));
    assert_eq!(send(&app, Method::GET, "/readyz", None, None).await.status, StatusCode::OK);

    storage.close().await.unwrap();
    assert_eq!(
        send(&app, Method::GET, "/readyz", None, None).await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

/// Fails every call with an infrastructure error, or panics when asked to.
struct BrokenStorage {
    panic: bool,
}

impl BrokenStorage {
    fn fail<T>(&self) -> Result<T> {
        if self.panic {
            panic!("storage invariant violated");
        }
        Err(AppError::Internal("connection refused by 10.0.0.7:3306".into()))
    }
}

#[async_trait::async_trait]
impl TaskStorage for BrokenStorage {
    async fn create(&self, _task: Task) -> Result<Task> {
        self.fail()
    }

    async fn list(&self) -> Result<Vec<Task>> {
        self.fail()
    }

    async fn get(&self, _id: &str) -> Result<Option<Task>> {
        self.fail()
    }

    async fn mark_done(&self, _id: &str, _done: bool) -> Result<Option<Task>> {
        self.fail()
    }
}

#[rstest]
#[case(Method::GET, "/tasks", None)]
#[case(Method::POST, "/tasks", Some(r#"{"title":"x"}"#))]
#[case(Method::GET, "/tasks/abc", None)]
#[case(Method::PATCH, "/tasks/abc", Some(r#"{"done":true}"#))]
#[tokio::test]
async fn storage_failures_surface_as_internal(
    #[case] method: Method,
    #[case] uri: &str,
    #[case] body: Option<&str>,
) {
    let app = app_with(Arc::new(BrokenStorage { panic: false }), None);
    let response = send(&app, method, uri, Some("rid-500"), body).await;

    assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL");
    assert_eq!(response.json()["message"], "internal server error");
    assert!(!response.text().contains("10.0.0.7"));
}

#[tokio::test]
async fn handler_panic_is_contained() {
    let app = app_with(Arc::new(BrokenStorage { panic: true }), None);

    let response = send(&app, Method::GET, "/tasks", Some("rid-panic"), None).await;
    assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL");
    assert_eq!(response.json()["request_id"], "rid-panic");
    assert!(!response.text().contains("invariant"));

    let health = send(&app, Method::GET, "/healthz", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
}

#[tokio::test]
async fn created_at_is_within_the_request_window() {
    let app = memory_app();
    let before = Utc::now() - chrono::Duration::seconds(1);
    let created = send(&app, Method::POST, "/tasks", None, Some(r#"{"title":"t"}"#)).await;
    let after = Utc::now();

    let at: DateTime<Utc> = created.json()["create_at"].as_str().unwrap().parse().unwrap();
    assert!(at >= before && at <= after);
}
