use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use super::RequestId;
use crate::error::{ErrorCode, INTERNAL_MESSAGE, error_response};

/// Bounds how long the routes below may take to produce a response. An
/// overrun is answered with the `INTERNAL`/500 error body.
#[derive(Debug, Clone, Copy)]
pub struct WriteTimeoutLayer {
    timeout: Duration,
}

impl WriteTimeoutLayer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for WriteTimeoutLayer {
    type Service = WriteTimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        WriteTimeoutService {
            inner,
            timeout: self.timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WriteTimeoutService<S> {
    inner: S,
    timeout: Duration,
}

impl<S, ReqBody> Service<Request<ReqBody>> for WriteTimeoutService<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId::new(""));
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let timeout = self.timeout;

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match tokio::time::timeout(timeout, inner.call(request)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        request_id = %request_id,
                        %method,
                        path,
                        timeout_ms = timeout.as_millis() as u64,
                        "handler exceeded write timeout"
                    );
                    Ok(error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorCode::Internal,
                        INTERNAL_MESSAGE,
                        &request_id,
                    ))
                }
            }
        })
    }
}
