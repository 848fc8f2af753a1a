pub mod health;
pub mod middleware;
pub mod task;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::timeout::RequestBodyTimeoutLayer;

use crate::api::middleware::{AccessLogLayer, RecoverLayer, RequestIdLayer, WriteTimeoutLayer};
use crate::utils::state::AppState;

/// Per-request limits applied just outside the router.
#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    /// Time allowed to receive the request body.
    pub read: Duration,
    /// Time allowed to produce the response.
    pub write: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(5),
            write: Duration::from_secs(10),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/tasks", get(task::list_tasks).post(task::create_task))
        .route("/tasks/{id}", get(task::get_task).patch(task::mark_done))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .with_state(state)
}

/// Wraps `router` in the request pipeline. Outermost first: correlation id,
/// access log, panic recovery, then the HTTP timeouts around the routes.
pub fn with_middleware(router: Router, timeouts: HttpTimeouts) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(RequestIdLayer::new())
            .layer(AccessLogLayer::new())
            .layer(RecoverLayer::new())
            .layer(WriteTimeoutLayer::new(timeouts.write))
            .layer(RequestBodyTimeoutLayer::new(timeouts.read)),
    )
}

/// The fully layered application router.
pub fn app_router(state: Arc<AppState>, timeouts: HttpTimeouts) -> Router {
    with_middleware(create_router(state), timeouts)
}
