use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::api::middleware::RequestId;
use crate::domain::task::Task;
use crate::error::{ApiError, AppError, ForRequest};
use crate::utils::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateTaskReq {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkDoneReq {
    #[serde(default)]
    done: bool,
}

/// Bodies that cannot be read (over the size limit, read timeout) are
/// reported the same way as bodies that are not valid JSON.
fn decode<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
    request_id: &RequestId,
) -> ApiResult<T> {
    let body = body
        .map_err(|rejection| AppError::InvalidJson(rejection.body_text()))
        .for_request(request_id)?;
    serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidJson(e.to_string()))
        .for_request(request_id)
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.tasks.list().await.for_request(&request_id)?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let req: CreateTaskReq = decode(body, &request_id)?;
    let task = state.tasks.create(&req.title).await.for_request(&request_id)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    match state.tasks.get(&id).await.for_request(&request_id)? {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::new(AppError::TaskNotFound(id), &request_id)),
    }
}

pub async fn mark_done(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<Task>> {
    let req: MarkDoneReq = decode(body, &request_id)?;
    match state
        .tasks
        .mark_done(&id, req.done)
        .await
        .for_request(&request_id)?
    {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::new(AppError::TaskNotFound(id), &request_id)),
    }
}
