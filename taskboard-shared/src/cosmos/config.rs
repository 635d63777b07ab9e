/// Cosmos DB connection settings
///
/// # Environment Variables
///
/// - `COSMOS_DB_URI`: Account endpoint, e.g. `https://myaccount.documents.azure.com:443/` (required)
/// - `COSMOS_DB_KEY`: Primary or secondary master key, base64 (required)
/// - `COSMOS_DB_DATABASE`: Database id (default: todos)
/// - `COSMOS_DB_CONTAINER`: Container id (default: tasks)
/// - `COSMOS_DB_ACCEPT_INVALID_CERTS`: Trust self-signed certificates, for the emulator (default: false)
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::cosmos::CosmosConfig;
///
/// # fn example() -> Result<(), taskboard_shared::cosmos::CosmosError> {
/// let config = CosmosConfig::from_env()?;
/// println!("Cosmos endpoint: {}", config.endpoint);
/// # Ok(())
/// # }
/// ```

use super::CosmosError;
use std::env;

/// Default database id
pub const DEFAULT_DATABASE: &str = "todos";

/// Default container id
pub const DEFAULT_CONTAINER: &str = "tasks";

/// Cosmos DB configuration
#[derive(Clone)]
pub struct CosmosConfig {
    /// Account endpoint without trailing slash
    pub endpoint: String,

    /// Base64 master key
    pub key: String,

    /// Database id
    pub database: String,

    /// Container id
    pub container: String,

    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl std::fmt::Debug for CosmosConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("database", &self.database)
            .field("container", &self.container)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl CosmosConfig {
    /// Creates a configuration for the default `todos`/`tasks` layout
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            key: key.into(),
            database: DEFAULT_DATABASE.to_string(),
            container: DEFAULT_CONTAINER.to_string(),
            accept_invalid_certs: false,
        }
    }

    /// Loads configuration from environment variables
    ///
    /// Reads a `.env` file first if one is present.
    ///
    /// # Errors
    ///
    /// Returns `CosmosError::Config` if `COSMOS_DB_URI` or `COSMOS_DB_KEY`
    /// is missing or empty.
    pub fn from_env() -> Result<Self, CosmosError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CosmosError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    CosmosError::Config(format!("{} environment variable is required", name))
                })
        };

        let endpoint = required("COSMOS_DB_URI")?;
        let key = required("COSMOS_DB_KEY")?;

        let mut config = Self::new(endpoint, key);

        if let Some(database) = lookup("COSMOS_DB_DATABASE").filter(|v| !v.is_empty()) {
            config.database = database;
        }
        if let Some(container) = lookup("COSMOS_DB_CONTAINER").filter(|v| !v.is_empty()) {
            config.container = container;
        }
        config.accept_invalid_certs = lookup("COSMOS_DB_ACCEPT_INVALID_CERTS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(config)
    }
}
