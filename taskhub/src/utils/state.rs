use std::sync::Arc;

use crate::api::health::ReadyCheck;
use crate::service::task::TaskService;

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    /// `None` means there is no external dependency to wait for.
    pub ready_check: Option<Arc<dyn ReadyCheck>>,
}

impl AppState {
    pub fn new(tasks: TaskService, ready_check: Option<Arc<dyn ReadyCheck>>) -> Self {
        AppState { tasks, ready_check }
    }
}
