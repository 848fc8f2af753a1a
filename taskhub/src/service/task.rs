use std::sync::Arc;

use chrono::{SubsecRound, Utc};

use crate::domain::task::{MAX_TITLE_LEN, Task};
use crate::error::{AppError, Result};
use crate::storage::TaskStorage;
use crate::utils::id::gen_task_id;

/// Task business rules on top of a [`TaskStorage`] backend.
///
/// Validation and identity/timestamp assignment live here; found/not-found
/// semantics stay with the storage backend.
#[derive(Clone)]
pub struct TaskService {
    storage: Arc<dyn TaskStorage>,
}

impl TaskService {
    pub fn new(storage: Arc<dyn TaskStorage>) -> Self {
        Self { storage }
    }

    pub async fn create(&self, title: &str) -> Result<Task> {
        let title = validate_title(title)?;
        // Microsecond precision is what the SQL backend persists.
        let task = Task::new(gen_task_id(), title, Utc::now().trunc_subsecs(6));
        self.storage.create(task).await
    }

    pub async fn list(&self) -> Result<Vec<Task>> {
        self.storage.list().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Task>> {
        self.storage.get(id).await
    }

    pub async fn mark_done(&self, id: &str, done: bool) -> Result<Option<Task>> {
        self.storage.mark_done(id, done).await
    }
}

fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::InvalidTitle);
    }
    Ok(title)
}
