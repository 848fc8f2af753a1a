use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::task::Task;
use crate::error::{AppError, Result};
use crate::storage::TaskStorage;

#[derive(Debug, Default)]
struct Tasks {
    by_id: HashMap<String, Task>,
    // insertion order, append-only
    order: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryTaskStorage {
    tasks: RwLock<Tasks>,
}

impl MemoryTaskStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TaskStorage for MemoryTaskStorage {
    async fn create(&self, task: Task) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.by_id.contains_key(&task.id) {
            return Err(AppError::DuplicateTask(task.id));
        }
        tasks.order.push(task.id.clone());
        tasks.by_id.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .order
            .iter()
            .filter_map(|id| tasks.by_id.get(id).cloned())
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.by_id.get(id).cloned())
    }

    async fn mark_done(&self, id: &str, done: bool) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.by_id.get_mut(id).map(|task| {
            task.done = done;
            task.clone()
        }))
    }
}
