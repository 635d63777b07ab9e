/// Cosmos DB REST client
///
/// A thin, typed wrapper over the SQL API's REST surface. The client owns a
/// `reqwest::Client` (which pools connections internally) and the decoded
/// master key; [`DatabaseRef`] and [`ContainerRef`] are plain handles built
/// locally, so creating them never touches the network.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::cosmos::{CosmosClient, CosmosConfig};
/// use serde_json::Value;
///
/// # async fn example() -> Result<(), taskboard_shared::cosmos::CosmosError> {
/// let config = CosmosConfig::from_env()?;
/// let client = CosmosClient::new(&config)?;
///
/// let database = client.create_database_if_not_exists("todos").await?;
/// let container = database.create_container_if_not_exists("tasks", "/id").await?;
///
/// let docs: Vec<Value> = container.read_all_documents().await?;
/// println!("{} documents", docs.len());
/// # Ok(())
/// # }
/// ```

use super::auth::{format_date, MasterKey, ResourceType};
use super::{CosmosConfig, CosmosError};
use chrono::Utc;
use reqwest::{Method, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// REST API version sent with every request
pub const API_VERSION: &str = "2018-12-31";

const HEADER_DATE: &str = "x-ms-date";
const HEADER_VERSION: &str = "x-ms-version";
const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_CONTINUATION: &str = "x-ms-continuation";

/// Error body returned by the service
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,

    #[serde(default)]
    message: String,
}

/// One page of a document feed
#[derive(Debug, Deserialize)]
struct DocumentFeed<T> {
    #[serde(rename = "Documents")]
    documents: Vec<T>,
}

/// A single signed request
struct CosmosRequest<'a, B: Serialize> {
    method: Method,
    resource_type: ResourceType,
    /// Link that gets signed (un-encoded)
    resource_link: String,
    /// URL path (encoded)
    path: String,
    partition_key: Option<&'a str>,
    continuation: Option<&'a str>,
    body: Option<&'a B>,
}

struct ClientInner {
    endpoint: String,
    key: MasterKey,
}

/// Cosmos DB account client
///
/// Cheap to clone; clones share the connection pool and key.
#[derive(Clone)]
pub struct CosmosClient {
    http: reqwest::Client,
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for CosmosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl CosmosClient {
    /// Creates a client from configuration
    ///
    /// No request is sent.
    ///
    /// # Errors
    ///
    /// Returns `CosmosError::Config` if the key is not base64 or the HTTP
    /// client cannot be built.
    pub fn new(config: &CosmosConfig) -> Result<Self, CosmosError> {
        let key = MasterKey::from_base64(&config.key)?;

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| CosmosError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            inner: Arc::new(ClientInner {
                endpoint: config.endpoint.trim_end_matches('/').to_string(),
                key,
            }),
        })
    }

    /// Account endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Returns a handle to a database without checking that it exists
    pub fn database(&self, id: impl Into<String>) -> DatabaseRef {
        DatabaseRef {
            client: self.clone(),
            id: id.into(),
        }
    }

    /// Creates the database unless it already exists
    ///
    /// A `409 Conflict` answer counts as success.
    pub async fn create_database_if_not_exists(&self, id: &str) -> Result<DatabaseRef, CosmosError> {
        let body = json!({ "id": id });
        let result = self
            .send(CosmosRequest {
                method: Method::POST,
                resource_type: ResourceType::Databases,
                resource_link: String::new(),
                path: "dbs".to_string(),
                partition_key: None,
                continuation: None,
                body: Some(&body),
            })
            .await;

        match result {
            Ok(_) => debug!(database = id, "Created database"),
            Err(err) if err.is_conflict() => debug!(database = id, "Database already exists"),
            Err(err) => return Err(err),
        }

        Ok(self.database(id))
    }

    async fn send<B: Serialize>(&self, request: CosmosRequest<'_, B>) -> Result<Response, CosmosError> {
        let date = format_date(Utc::now());
        let authorization = self.inner.key.authorization(
            request.method.as_str(),
            request.resource_type,
            &request.resource_link,
            &date,
        );
        let url = format!("{}/{}", self.inner.endpoint, request.path);

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(HEADER_DATE, &date)
            .header(HEADER_VERSION, API_VERSION)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(partition_key) = request.partition_key {
            let value = serde_json::to_string(&[partition_key])
                .map_err(|e| CosmosError::Decode(e.to_string()))?;
            builder = builder.header(HEADER_PARTITION_KEY, value);
        }
        if let Some(continuation) = request.continuation {
            builder = builder.header(HEADER_CONTINUATION, continuation);
        }
        if let Some(body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status().as_u16(),
            "Cosmos request completed"
        );

        check_status(response).await
    }
}

/// Turns non-success answers into `CosmosError::Http`
async fn check_status(response: Response) -> Result<Response, CosmosError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_else(|_| ErrorBody {
        code: String::new(),
        message: text,
    });

    Err(CosmosError::Http {
        status: status.as_u16(),
        code: if body.code.is_empty() {
            status.canonical_reason().unwrap_or("Unknown").to_string()
        } else {
            body.code
        },
        message: body.message,
    })
}

/// Handle to a database
#[derive(Debug, Clone)]
pub struct DatabaseRef {
    client: CosmosClient,
    id: String,
}

impl DatabaseRef {
    /// Database id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resource link, e.g. `dbs/todos`
    pub fn link(&self) -> String {
        format!("dbs/{}", self.id)
    }

    /// Returns a handle to a container without checking that it exists
    pub fn container(&self, id: impl Into<String>) -> ContainerRef {
        ContainerRef {
            client: self.client.clone(),
            database: self.id.clone(),
            id: id.into(),
        }
    }

    /// Creates the container unless it already exists
    ///
    /// `partition_key_path` is a JSON path such as `/id`. A `409 Conflict`
    /// answer counts as success.
    pub async fn create_container_if_not_exists(
        &self,
        id: &str,
        partition_key_path: &str,
    ) -> Result<ContainerRef, CosmosError> {
        let body = json!({
            "id": id,
            "partitionKey": {
                "paths": [partition_key_path],
                "kind": "Hash"
            }
        });
        let link = self.link();

        let result = self
            .client
            .send(CosmosRequest {
                method: Method::POST,
                resource_type: ResourceType::Containers,
                path: format!("{}/colls", link),
                resource_link: link,
                partition_key: None,
                continuation: None,
                body: Some(&body),
            })
            .await;

        match result {
            Ok(_) => debug!(database = %self.id, container = id, "Created container"),
            Err(err) if err.is_conflict() => {
                debug!(database = %self.id, container = id, "Container already exists")
            }
            Err(err) => return Err(err),
        }

        Ok(self.container(id))
    }
}

/// Handle to a container
#[derive(Debug, Clone)]
pub struct ContainerRef {
    client: CosmosClient,
    database: String,
    id: String,
}

impl ContainerRef {
    /// Container id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resource link, e.g. `dbs/todos/colls/tasks`
    pub fn link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.id)
    }

    fn document_link(&self, id: &str) -> String {
        format!("{}/docs/{}", self.link(), id)
    }

    fn document_path(&self, id: &str) -> String {
        format!("{}/docs/{}", self.link(), urlencoding::encode(id))
    }

    /// Reads the container resource itself
    pub async fn read(&self) -> Result<(), CosmosError> {
        let link = self.link();
        self.client
            .send::<()>(CosmosRequest {
                method: Method::GET,
                resource_type: ResourceType::Containers,
                path: link.clone(),
                resource_link: link,
                partition_key: None,
                continuation: None,
                body: None,
            })
            .await?;
        Ok(())
    }

    /// Reads every document, following continuation tokens across pages
    pub async fn read_all_documents<T: DeserializeOwned>(&self) -> Result<Vec<T>, CosmosError> {
        let link = self.link();
        let path = format!("{}/docs", link);
        let mut documents = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let response = self
                .client
                .send::<()>(CosmosRequest {
                    method: Method::GET,
                    resource_type: ResourceType::Documents,
                    resource_link: link.clone(),
                    path: path.clone(),
                    partition_key: None,
                    continuation: continuation.as_deref(),
                    body: None,
                })
                .await?;

            let next = response
                .headers()
                .get(HEADER_CONTINUATION)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(str::to_string);

            let page: DocumentFeed<T> = response.json().await?;
            documents.extend(page.documents);

            match next {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    /// Point read; `Ok(None)` when the document does not exist
    pub async fn read_document<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, CosmosError> {
        let result = self
            .client
            .send::<()>(CosmosRequest {
                method: Method::GET,
                resource_type: ResourceType::Documents,
                resource_link: self.document_link(id),
                path: self.document_path(id),
                partition_key: Some(id),
                continuation: None,
                body: None,
            })
            .await;

        match result {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Inserts a new document; fails with 409 if the id is taken
    pub async fn create_document<T, R>(&self, partition_key: &str, document: &T) -> Result<R, CosmosError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let link = self.link();
        let response = self
            .client
            .send(CosmosRequest {
                method: Method::POST,
                resource_type: ResourceType::Documents,
                path: format!("{}/docs", link),
                resource_link: link,
                partition_key: Some(partition_key),
                continuation: None,
                body: Some(document),
            })
            .await?;

        Ok(response.json().await?)
    }

    /// Replaces an existing document; fails with 404 if it does not exist
    pub async fn replace_document<T, R>(&self, id: &str, document: &T) -> Result<R, CosmosError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .send(CosmosRequest {
                method: Method::PUT,
                resource_type: ResourceType::Documents,
                resource_link: self.document_link(id),
                path: self.document_path(id),
                partition_key: Some(id),
                continuation: None,
                body: Some(document),
            })
            .await?;

        Ok(response.json().await?)
    }

    /// Deletes a document; fails with 404 if it does not exist
    pub async fn delete_document(&self, id: &str) -> Result<(), CosmosError> {
        self.client
            .send::<()>(CosmosRequest {
                method: Method::DELETE,
                resource_type: ResourceType::Documents,
                resource_link: self.document_link(id),
                path: self.document_path(id),
                partition_key: Some(id),
                continuation: None,
                body: None,
            })
            .await?;

        Ok(())
    }
}
