/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `STATIC_DIR`: Directory holding the single-page app (default: public)
/// - `CORS_ORIGINS`: Comma separated allowed origins, `*` for any (default: *)
/// - `COSMOS_DB_URI`: Cosmos DB account endpoint (required)
/// - `COSMOS_DB_KEY`: Cosmos DB master key (required)
/// - `RUST_LOG`: Log level (default: debug for this crate)
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::path::PathBuf;
use taskboard_shared::cosmos::CosmosConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Document database configuration
    pub cosmos: CosmosConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Directory served for non-API GET requests
    pub static_dir: PathBuf,

    /// Allowed CORS origins (`*` means any)
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: PathBuf::from("public"),
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ApiConfig {
    /// Loads server settings from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `API_PORT` is not a valid port number.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let host = env::var("API_HOST").unwrap_or(defaults.host);
        let port = match env::var("API_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("API_PORT must be a port number: {}", e))?,
            Err(_) => defaults.port,
        };
        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);
        let cors_origins = env::var("CORS_ORIGINS")
            .map(|origins| parse_origins(&origins))
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            host,
            port,
            static_dir,
            cors_origins,
        })
    }

    /// Whether any origin may call the API
    pub fn cors_permissive(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }
}

/// Splits a comma separated origin list, dropping blanks
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `COSMOS_DB_URI` or `COSMOS_DB_KEY` is missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Ok(Self {
            api: ApiConfig::from_env()?,
            cosmos: CosmosConfig::from_env()?,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
