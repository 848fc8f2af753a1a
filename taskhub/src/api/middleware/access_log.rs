use std::task::{Context, Poll};
use std::time::Instant;

use axum::http::{Request, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use super::RequestId;

/// Emits one `info` event per request once the inner chain has produced a
/// response: correlation id, method, path, final status and latency.
#[derive(Debug, Clone, Default)]
pub struct AccessLogLayer;

impl AccessLogLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct AccessLogService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: std::fmt::Display,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(RequestId::to_string)
            .unwrap_or_default();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let result = inner.call(request).await;
            let latency_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(response) => tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = response.status().as_u16(),
                    latency_ms,
                    "request"
                ),
                Err(e) => tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    latency_ms,
                    error = %e,
                    "request"
                ),
            }
            result
        })
    }
}
