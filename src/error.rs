// HTTP API Error Types
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Map, Value};

use crate::auth::AuthContext;
use crate::database::StoreError;
use crate::middleware::response::envelope;
use crate::task::{ExtensionFieldError, FieldErrors};

/// HTTP API error with status code and client-facing message
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<FieldErrors>,
    },

    // 404 Not Found
    NotFound(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::NotFound(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Error payload without the auth context
    pub fn to_json(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("message".to_string(), json!(self.message()));
        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            body.insert("errors".to_string(), json!(field_errors));
        }
        body
    }

    /// Attach the caller's auth context so the rendered body can echo it
    pub fn with_auth(self, auth: &AuthContext) -> ApiFailure {
        ApiFailure {
            auth: auth.clone(),
            error: self,
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// The body is missing, not JSON, not an object, or an empty object
    pub fn malformed_body() -> Self {
        ApiError::bad_request("Request must be JSON")
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<FieldErrors>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    /// A store failure, reported as `"<context>: <underlying error>"`
    pub fn persistence(context: &str, err: StoreError) -> Self {
        match &err {
            StoreError::Connection(_) => tracing::error!("{}: store unreachable: {}", context, err),
            StoreError::Config(_) => tracing::error!("{}: store misconfigured: {}", context, err),
            StoreError::Operation(_) | StoreError::Serialization(_) => {
                tracing::error!("{}: {}", context, err)
            }
        }
        ApiError::internal_server_error(format!("{}: {}", context, err))
    }
}

impl From<ExtensionFieldError> for ApiError {
    fn from(err: ExtensionFieldError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

/// Body buffering failures; only the size limit keeps its own status
impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::debug!("Request body over limit: {}", rejection.body_text());
            ApiError::PayloadTooLarge("Request body is too large".to_string())
        } else {
            tracing::debug!("Request body unreadable: {}", rejection.body_text());
            ApiError::malformed_body()
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

/// An [`ApiError`] bound to the caller it is reported to
#[derive(Debug)]
pub struct ApiFailure {
    pub auth: AuthContext,
    pub error: ApiError,
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiFailure {
    fn into_response(self) -> axum::response::Response {
        let status = self.error.status_code();
        let body = envelope(&self.auth, "error", self.error.to_json());
        (status, Json(body)).into_response()
    }
}
