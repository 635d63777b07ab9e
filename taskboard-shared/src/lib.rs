//! # Taskboard Shared Library
//!
//! Data access for the Taskboard API server: the task document model, the
//! `TaskStore` gateway contract, and its Cosmos DB implementation.
//!
//! ## Module Organization
//!
//! - `models`: Task documents
//! - `store`: Gateway trait, error contract and in-memory implementation
//! - `cosmos`: Cosmos DB REST client and the production store

pub mod cosmos;
pub mod models;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
