/// Azure Cosmos DB access over the REST API
///
/// # Modules
///
/// - `config`: Endpoint/key configuration from environment variables
/// - `auth`: Master-key request signing
/// - `client`: Account, database and container handles
/// - `store`: [`TaskStore`](crate::store::TaskStore) implementation

pub mod auth;
pub mod client;
pub mod config;
pub mod store;

pub use client::{ContainerRef, CosmosClient, DatabaseRef};
pub use config::CosmosConfig;
pub use store::CosmosTaskStore;

use thiserror::Error;

/// Cosmos DB client errors
#[derive(Error, Debug)]
pub enum CosmosError {
    /// Missing or invalid configuration
    #[error("Cosmos configuration error: {0}")]
    Config(String),

    /// The service answered with a non-success status
    #[error("Cosmos returned {status} {code}: {message}")]
    Http {
        status: u16,
        code: String,
        message: String,
    },

    /// Connection, TLS or timeout failure
    #[error("Cosmos transport error: {0}")]
    Transport(String),

    /// A request or response body could not be (de)serialized
    #[error("Cosmos decode error: {0}")]
    Decode(String),
}

impl CosmosError {
    /// HTTP status, if the service answered
    pub fn status(&self) -> Option<u16> {
        match self {
            CosmosError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for `404 Not Found`
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for `409 Conflict`
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

impl From<reqwest::Error> for CosmosError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CosmosError::Decode(err.to_string())
        } else {
            CosmosError::Transport(err.to_string())
        }
    }
}
