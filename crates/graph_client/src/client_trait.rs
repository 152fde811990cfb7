use async_trait::async_trait;

use todo_core::TaskStatus;

use crate::api::models::{TodoListRecord, TodoTaskRecord};
use crate::error::Result;

/// Remote task API surface used by the sync engine.
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list_task_lists(&self) -> Result<Vec<TodoListRecord>>;

    async fn list_tasks(&self, list_id: &str) -> Result<Vec<TodoTaskRecord>>;

    async fn set_task_status(
        &self,
        list_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<()>;
}
