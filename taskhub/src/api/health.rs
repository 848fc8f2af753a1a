use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::error::Result;
use crate::utils::state::AppState;

/// Upper bound for a single readiness probe.
pub const READY_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Dependency probe behind `/readyz`.
#[async_trait::async_trait]
pub trait ReadyCheck: Send + Sync {
    async fn ready(&self) -> Result<()>;
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(check) = &state.ready_check else {
        return (StatusCode::OK, "ok");
    };
    // Dropping the probe future on timeout (or client disconnect) cancels it.
    match tokio::time::timeout(READY_CHECK_TIMEOUT, check.ready()).await {
        Ok(Ok(())) => (StatusCode::OK, "ok"),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "not ready")
        }
        Err(_) => {
            tracing::warn!(timeout_ms = READY_CHECK_TIMEOUT.as_millis() as u64, "readiness check timed out");
            (StatusCode::SERVICE_UNAVAILABLE, "not ready")
        }
    }
}
