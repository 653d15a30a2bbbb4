//! Error handling module for the fleet dashboard.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.
//! Invalid query parameters never reach this module; the normalizer drops them silently.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NAVIGATION_FAILED: &str = "NAVIGATION_FAILED";
    pub const BACKEND_ERROR: &str = "BACKEND_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// Application error type.
#[derive(Debug, Clone)]
pub enum AppError {
    /// No session, or the backend rejected the session token
    Unauthorized(String),
    /// Resource not found
    NotFound(String),
    /// Malformed request body
    BadRequest(String),
    /// The next location could not be written
    Navigation(String),
    /// Backend answered with a non-success status
    Backend { status: u16, message: String },
    /// Backend unreachable or the response could not be read
    Network(String),
    /// Invalid configuration value
    Config(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Navigation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Backend { .. } => StatusCode::BAD_GATEWAY,
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::Navigation(_) => codes::NAVIGATION_FAILED,
            AppError::Backend { .. } => codes::BACKEND_ERROR,
            AppError::Network(_) => codes::NETWORK_ERROR,
            AppError::Config(_) => codes::CONFIG_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Navigation(msg) => msg.clone(),
            AppError::Backend { message, .. } => message.clone(),
            AppError::Network(msg) => msg.clone(),
            AppError::Config(msg) => msg.clone(),
        }
    }

    /// Whether a fetch that failed with this error is worth retrying.
    ///
    /// Transport failures and 5xx answers are transient; anything the backend
    /// rejected on its merits will be rejected again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Network(_) => true,
            AppError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Backend request error: {:?}", err);
        match err.status() {
            Some(status) => AppError::Backend {
                status: status.as_u16(),
                message: format!("Backend error: {}", err),
            },
            None => AppError::Network(format!("Network error: {}", err)),
        }
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Backend { status, .. } => Some(serde_json::json!({ "backendStatus": status })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
