/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`, and store failures convert
/// into it with `?`.
///
/// # Example
///
/// ```
/// use taskboard_api::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler(id: String) -> ApiResult<Json<String>> {
///     if id.is_empty() {
///         return Err(ApiError::BadRequest("Task id must not be empty".to_string()));
///     }
///     Ok(Json(id))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskboard_shared::store::StoreError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate task id
    Conflict(String),

    /// Internal server error (500)
    InternalError(String),

    /// Bad gateway (502) - the document database failed
    BadGateway(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Bad gateway: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg),
            ApiError::NotFound(msg) => ("not_found", msg),
            ApiError::Conflict(msg) => ("conflict", msg),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ("internal_error", "An internal error occurred".to_string())
            }
            ApiError::BadGateway(msg) => {
                tracing::error!("Task store failure: {}", msg);
                ("bad_gateway", "The task store could not complete the request".to_string())
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Task {} not found", id)),
            StoreError::Conflict(id) => ApiError::Conflict(format!("Task {} already exists", id)),
            StoreError::Remote {
                status: 400 | 413,
                message,
            } => ApiError::BadRequest(format!("Task store rejected the request: {}", message)),
            StoreError::Remote { status: 429, message } => {
                ApiError::ServiceUnavailable(format!("Task store is throttling requests: {}", message))
            }
            other @ (StoreError::Remote { .. } | StoreError::Transport(_)) => {
                ApiError::BadGateway(other.to_string())
            }
            StoreError::Serialization(msg) => ApiError::InternalError(format!("Serialization error: {}", msg)),
        }
    }
}
