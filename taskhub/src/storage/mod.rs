use crate::domain::task::Task;
use crate::error::Result;

pub mod driver;

/// Persistence contract shared by every task backend.
///
/// Absence is reported as `Ok(None)`; `Err` is reserved for infrastructure
/// failures. Both backends return tasks from `list` in creation order.
#[async_trait::async_trait]
pub trait TaskStorage: Send + Sync {
    /// Stores a fully populated task. Fails if the id is already taken.
    async fn create(&self, task: Task) -> Result<Task>;

    async fn list(&self) -> Result<Vec<Task>>;

    async fn get(&self, id: &str) -> Result<Option<Task>>;

    /// Sets the done flag and returns the task as persisted afterwards.
    async fn mark_done(&self, id: &str, done: bool) -> Result<Option<Task>>;

    /// Releases whatever the backend holds open.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
