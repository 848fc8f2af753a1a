use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::middleware::RequestId;
use crate::domain::task::MAX_TITLE_LEN;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // Client errors
    #[error("title must be non-empty and at most {MAX_TITLE_LEN} characters")]
    InvalidTitle,

    #[error("invalid json body: {0}")]
    InvalidJson(String),

    #[error("task {0} not found")]
    TaskNotFound(String),

    // Storage errors
    #[error("task {0} already exists")]
    DuplicateTask(String),

    #[error("stored row is malformed: {0}")]
    CorruptRow(String),

    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

/// Machine-readable error code carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidJson,
    InvalidArgument,
    NotFound,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    pub request_id: String,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            Self::InvalidJson(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidJson),
            Self::InvalidTitle => (StatusCode::BAD_REQUEST, ErrorCode::InvalidArgument),
            Self::TaskNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal),
        }
    }

    /// Message safe to hand to the client. Infrastructure details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::InvalidJson(_) => "invalid json body".to_string(),
            Self::InvalidTitle => format!("title is required (<= {MAX_TITLE_LEN} characters)"),
            Self::TaskNotFound(_) => "task not found".to_string(),
            _ => INTERNAL_MESSAGE.to_string(),
        }
    }
}

pub const INTERNAL_MESSAGE: &str = "internal server error";

/// An [`AppError`] bound to the request it occurred in.
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub request_id: RequestId,
}

impl ApiError {
    pub fn new(error: AppError, request_id: &RequestId) -> Self {
        Self {
            error,
            request_id: request_id.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.error.status_and_code();
        if status.is_server_error() {
            tracing::error!(request_id = %self.request_id, error = %self.error, "request failed");
        } else {
            tracing::debug!(request_id = %self.request_id, error = %self.error, "request rejected");
        }

        error_response(status, code, self.error.public_message(), &self.request_id)
    }
}

pub fn error_response(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    request_id: &RequestId,
) -> Response {
    let body = ErrorBody {
        code,
        message: message.into(),
        request_id: request_id.to_string(),
    };
    (status, Json(body)).into_response()
}

pub trait ForRequest<T> {
    fn for_request(self, request_id: &RequestId) -> std::result::Result<T, ApiError>;
}

impl<T> ForRequest<T> for Result<T> {
    fn for_request(self, request_id: &RequestId) -> std::result::Result<T, ApiError> {
        self.map_err(|e| ApiError::new(e, request_id))
    }
}
