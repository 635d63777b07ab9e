/// Cosmos DB backed task store
///
/// Owns the client plus the database and container handles for the lifetime
/// of the process. All three are immutable after construction, so one
/// instance is shared by every request handler.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::cosmos::{CosmosConfig, CosmosTaskStore};
/// use taskboard_shared::store::TaskStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = CosmosTaskStore::new(CosmosConfig::from_env()?)?;
/// store.init().await?;
///
/// for task in store.list().await? {
///     println!("{}", task.id);
/// }
/// # Ok(())
/// # }
/// ```

use super::{ContainerRef, CosmosClient, CosmosConfig, CosmosError, DatabaseRef};
use crate::models::task::{NewTask, Task};
use crate::store::{StoreError, StoreResult, TaskStore};
use async_trait::async_trait;
use tracing::{debug, info};

/// Partition key path of the tasks container
pub const PARTITION_KEY_PATH: &str = "/id";

/// [`TaskStore`] backed by a Cosmos DB container
#[derive(Debug, Clone)]
pub struct CosmosTaskStore {
    client: CosmosClient,
    database: DatabaseRef,
    container: ContainerRef,
}

impl CosmosTaskStore {
    /// Builds the store from configuration
    ///
    /// Only constructs local handles; no request is sent until
    /// [`TaskStore::init`] or another operation runs.
    ///
    /// # Errors
    ///
    /// Returns `CosmosError::Config` if the key cannot be decoded.
    pub fn new(config: CosmosConfig) -> Result<Self, CosmosError> {
        let client = CosmosClient::new(&config)?;
        let database = client.database(config.database.as_str());
        let container = database.container(config.container.as_str());

        info!(
            endpoint = client.endpoint(),
            database = database.id(),
            container = container.id(),
            "Configured Cosmos task store"
        );

        Ok(Self {
            client,
            database,
            container,
        })
    }

    /// Underlying container handle
    pub fn container(&self) -> &ContainerRef {
        &self.container
    }
}

/// Maps client errors onto the store contract for a given task id
fn store_error(err: CosmosError, id: &str) -> StoreError {
    match err {
        CosmosError::Http { status: 404, .. } => StoreError::NotFound(id.to_string()),
        CosmosError::Http { status: 409, .. } => StoreError::Conflict(id.to_string()),
        CosmosError::Http {
            status,
            code,
            message,
        } => StoreError::Remote {
            status,
            message: if message.is_empty() { code } else { message },
        },
        CosmosError::Transport(msg) => StoreError::Transport(msg),
        CosmosError::Decode(msg) => StoreError::Serialization(msg),
        CosmosError::Config(msg) => StoreError::Transport(msg),
    }
}

/// Maps errors for collection-level calls, where 404/409 carry no task id
fn collection_error(err: CosmosError) -> StoreError {
    match err {
        CosmosError::Http {
            status,
            code,
            message,
        } => StoreError::Remote {
            status,
            message: if message.is_empty() { code } else { message },
        },
        other => store_error(other, ""),
    }
}

#[async_trait]
impl TaskStore for CosmosTaskStore {
    async fn init(&self) -> StoreResult<()> {
        self.client
            .create_database_if_not_exists(self.database.id())
            .await
            .map_err(collection_error)?;

        self.database
            .create_container_if_not_exists(self.container.id(), PARTITION_KEY_PATH)
            .await
            .map_err(collection_error)?;

        info!(
            database = self.database.id(),
            container = self.container.id(),
            "Task collection ready"
        );
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Task>> {
        let tasks: Vec<Task> = self
            .container
            .read_all_documents()
            .await
            .map_err(collection_error)?;

        debug!(count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Task>> {
        self.container
            .read_document(id)
            .await
            .map_err(|e| store_error(e, id))
    }

    async fn create(&self, task: NewTask) -> StoreResult<Task> {
        let task = task.into_task();
        let stored: Task = self
            .container
            .create_document(&task.id, &task)
            .await
            .map_err(|e| store_error(e, &task.id))?;

        debug!(task_id = %stored.id, "Created task");
        Ok(stored)
    }

    async fn update(&self, task: Task) -> StoreResult<Task> {
        let stored: Task = self
            .container
            .replace_document(&task.id, &task)
            .await
            .map_err(|e| store_error(e, &task.id))?;

        debug!(task_id = %stored.id, "Replaced task");
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.container
            .delete_document(id)
            .await
            .map_err(|e| store_error(e, id))?;

        debug!(task_id = id, "Deleted task");
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.container.read().await.map_err(collection_error)
    }
}
