/// Task store gateway
///
/// The [`TaskStore`] trait is the single seam between HTTP handlers and the
/// document database. Every operation maps to one remote call (one per page
/// for [`TaskStore::list`]); there is no caching, batching or retry.
///
/// # Implementations
///
/// - [`crate::cosmos::CosmosTaskStore`]: Azure Cosmos DB over REST
/// - [`memory::InMemoryTaskStore`]: process-local, for tests and local runs
///
/// # Error Contract
///
/// | Operation | Missing id      | Duplicate id      |
/// |-----------|-----------------|-------------------|
/// | `get`     | `Ok(None)`      | n/a               |
/// | `create`  | n/a             | `Err(Conflict)`   |
/// | `update`  | `Err(NotFound)` | n/a               |
/// | `delete`  | `Err(NotFound)` | n/a               |
///
/// # Example
///
/// ```
/// use taskboard_shared::models::task::NewTask;
/// use taskboard_shared::store::{memory::InMemoryTaskStore, TaskStore};
///
/// # async fn example() -> Result<(), taskboard_shared::store::StoreError> {
/// let store = InMemoryTaskStore::new();
/// store.init().await?;
///
/// let task = store.create(NewTask::default()).await?;
/// assert!(store.get(&task.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

pub mod memory;

use crate::models::task::{NewTask, Task};
use async_trait::async_trait;
use thiserror::Error;

/// Task store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No document with this id exists
    #[error("Task not found: {0}")]
    NotFound(String),

    /// A document with this id already exists
    #[error("Task already exists: {0}")]
    Conflict(String),

    /// The database answered with an error status (auth, throttling, ...)
    #[error("Store returned status {status}: {message}")]
    Remote { status: u16, message: String },

    /// The request never got an answer
    #[error("Store transport error: {0}")]
    Transport(String),

    /// A document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD access to the task collection
///
/// Implementations hold only immutable handles after construction, so a
/// single instance is shared across all request handlers behind an `Arc`.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Ensures the database and collection exist, creating them if absent
    async fn init(&self) -> StoreResult<()>;

    /// Returns every task in the collection
    async fn list(&self) -> StoreResult<Vec<Task>>;

    /// Point lookup by id; `Ok(None)` when absent
    async fn get(&self, id: &str) -> StoreResult<Option<Task>>;

    /// Stores a new task, assigning an id when the payload has none
    async fn create(&self, task: NewTask) -> StoreResult<Task>;

    /// Replaces an existing task wholesale
    async fn update(&self, task: Task) -> StoreResult<Task>;

    /// Removes a task
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Verifies the collection is reachable
    async fn ping(&self) -> StoreResult<()>;
}
