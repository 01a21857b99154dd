// HTTP API Error Types
use axum::extract::rejection::JsonRejection;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::{password::PasswordError, JwtError};
use crate::database::models::ValidationError;
use crate::database::StoreError;
use crate::filter::FilterError;

const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError(String),
    InvalidJson(String),
    /// Unique constraint clash, answered as 400 like other input problems
    Conflict(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error; `detail` is logged, never shown in production
    InternalServerError { message: String, detail: String },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::ValidationError(_)
            | ApiError::InvalidJson(_)
            | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::ValidationError(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::InternalServerError { message, .. } => message,
        }
    }

    /// `fail` for client errors, `error` for server errors
    pub fn status_label(&self) -> &'static str {
        if self.status_code().is_client_error() {
            "fail"
        } else {
            "error"
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "status": self.status_label(),
            "message": self.message(),
            "data": null,
        })
    }
}

/// Error envelope and debug chain carried on every error response.
/// `middleware::stack` renders the chain into the body outside production.
#[derive(Clone, Debug)]
pub struct ErrorStack {
    pub body: Value,
    pub stack: String,
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        ApiError::ValidationError(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(detail: impl Into<String>) -> Self {
        ApiError::InternalServerError {
            message: GENERIC_INTERNAL_MESSAGE.to_string(),
            detail: detail.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field, .. } if field == "email" => {
                ApiError::conflict("Email already in use")
            }
            StoreError::Duplicate { collection, field } => {
                ApiError::conflict(format!("Duplicate {} value in {}", field, collection))
            }
            other => ApiError::internal_server_error(other.to_string()),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation_error(err.to_string())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::unauthorized("Your token has expired. Please log in again"),
            JwtError::Invalid(_) => ApiError::unauthorized("Invalid token. Please log in again"),
            other => ApiError::internal_server_error(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal_server_error(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let ApiError::InternalServerError { detail, .. } = &self {
            tracing::error!("Internal error: {}", detail);
        }
        let body = self.to_json();
        let stack = ErrorStack {
            body: body.clone(),
            stack: format!("{:?}", self),
        };
        let mut response = (self.status_code(), Json(body)).into_response();
        response.extensions_mut().insert(stack);
        response
    }
}
