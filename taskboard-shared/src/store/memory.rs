/// In-memory task store
///
/// Keeps documents in insertion order behind a tokio `RwLock`. Follows the
/// same error contract as the Cosmos-backed store, which makes it a drop-in
/// replacement in handler tests.

use super::{StoreError, StoreResult, TaskStore};
use crate::models::task::{NewTask, Task};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local [`TaskStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given tasks
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(tasks)),
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn init(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Task>> {
        Ok(self.tasks.read().await.clone())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn create(&self, task: NewTask) -> StoreResult<Task> {
        let task = task.into_task();
        let mut tasks = self.tasks.write().await;

        if tasks.iter().any(|existing| existing.id == task.id) {
            return Err(StoreError::Conflict(task.id));
        }

        debug!(task_id = %task.id, "Created task in memory");
        tasks.push(task.clone());
        Ok(task)
    }

    async fn update(&self, task: Task) -> StoreResult<Task> {
        let mut tasks = self.tasks.write().await;
        let slot = tasks
            .iter_mut()
            .find(|existing| existing.id == task.id)
            .ok_or_else(|| StoreError::NotFound(task.id.clone()))?;

        *slot = task.clone();
        Ok(task)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut tasks = self.tasks.write().await;
        let index = tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        tasks.remove(index);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
