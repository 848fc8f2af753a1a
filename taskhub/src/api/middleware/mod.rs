//! Cross-cutting layers wrapped around the router.
//!
//! Nesting is fixed, outermost first: [`RequestIdLayer`] so every later log
//! line and error body can be correlated, [`AccessLogLayer`] so the final
//! status is recorded even after a fault, and [`RecoverLayer`] shielding
//! only the router. [`WriteTimeoutLayer`] sits inside recovery and answers
//! an overrun with the same `INTERNAL` body.

pub mod access_log;
pub mod recover;
pub mod request_id;
pub mod timeout;

pub use access_log::AccessLogLayer;
pub use recover::RecoverLayer;
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
pub use timeout::WriteTimeoutLayer;
