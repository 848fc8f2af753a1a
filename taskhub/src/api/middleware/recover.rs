use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::Once;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use futures::FutureExt;
use futures::future::BoxFuture;
use tower::{Layer, Service};

use super::RequestId;
use crate::error::{ErrorCode, INTERNAL_MESSAGE, error_response};

thread_local! {
    static PANIC_BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Chains a panic hook that stashes the backtrace of the panicking thread,
/// so the recovery boundary can log where the fault happened rather than
/// where it was caught.
fn install_backtrace_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            PANIC_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

fn take_backtrace() -> String {
    PANIC_BACKTRACE
        .with(|slot| slot.borrow_mut().take())
        .map(|bt| bt.to_string())
        .unwrap_or_else(|| "<no backtrace captured>".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Turns a panic anywhere beneath it into a logged `INTERNAL`/500 response.
#[derive(Debug, Clone)]
pub struct RecoverLayer;

impl RecoverLayer {
    pub fn new() -> Self {
        install_backtrace_hook();
        Self
    }
}

impl Default for RecoverLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for RecoverLayer {
    type Service = RecoverService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RecoverService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RecoverService<S> {
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for RecoverService<S>
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

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            // `call` itself runs inside the boundary as well as the future it returns.
            let guarded = AssertUnwindSafe(async move { inner.call(request).await });
            match guarded.catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    tracing::error!(
                        request_id = %request_id,
                        panic = panic_message(payload.as_ref()),
                        backtrace = %take_backtrace(),
                        "panic recovered"
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
