//! Error types for the resource API

use hyper::StatusCode;

/// Main error type for API and store operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Requested entity (resource, backing file) does not exist.
    /// The payload is the user-visible detail, e.g. "Resource not found".
    #[error("{0}")]
    NotFound(String),

    /// Malformed request payload or query parameter
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A store call exceeded its deadline
    #[error("Store operation '{0}' timed out")]
    Timeout(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn resource_not_found() -> Self {
        Self::NotFound("Resource not found".to_string())
    }

    pub fn file_not_found() -> Self {
        Self::NotFound("File not found".to_string())
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-visible `detail` string for the JSON error body.
    ///
    /// Database and internal errors are not echoed back to clients.
    pub fn detail(&self) -> String {
        match self {
            Self::NotFound(msg) => msg.clone(),
            Self::Validation(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::ServiceUnavailable(_) => "Service unavailable".to_string(),
            Self::Timeout(_) => "Upstream store timed out".to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("Invalid JSON body: {}", err))
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::de::Error> for ApiError {
    fn from(err: bson::de::Error) -> Self {
        Self::Database(format!("Failed to decode document: {}", err))
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
