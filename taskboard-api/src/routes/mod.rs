/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `tasks`: Task CRUD endpoints

pub mod health;
pub mod tasks;

use crate::error::ApiError;
use axum::extract::OriginalUri;

/// Catch-all for unknown `/api/...` paths
///
/// Keeps API misses as JSON 404s instead of handing them to the SPA.
/// A bare `/api` is not reserved and reaches the SPA.
pub async fn api_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("No API route for {}", uri.path()))
}
