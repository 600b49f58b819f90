use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::validation::ValidationIssue;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Draft failed local validation; nothing was sent.
    Validation(Vec<ValidationIssue>),
    /// The remote store answered 404 for the requested resource.
    NotFound(String),
    /// The remote store answered with a non-success status (or an unreadable body).
    Remote {
        /// HTTP status returned by the store.
        status: u16,
        /// Response text as received.
        body: String,
    },
    /// The request never completed (connect, timeout, reset).
    Network(String),
    /// Request rejected before reaching the store (e.g. a blank place name).
    BadRequest(String),
    /// Another operation on the same resource is still in flight.
    Conflict(String),
    /// Internal error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Returns the innermost error, skipping any context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the request never reached (or never came back from) the store.
    pub fn is_network(&self) -> bool {
        matches!(self.root(), AppError::Network(_))
    }

    fn status_code(&self) -> StatusCode {
        match self.root() {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Remote { .. } => StatusCode::BAD_GATEWAY,
            AppError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) | AppError::WithContext { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(issues) => {
                write!(f, "Validation failed: ")?;
                for (i, issue) in issues.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", issue)?;
                }
                Ok(())
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Remote { status, body } => {
                write!(f, "Places API returned {}: {}", status, body)
            }
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Logs errors appropriately based on their severity.
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self.root() {
            AppError::Validation(issues) => {
                tracing::debug!("Rejected draft with {} issue(s)", issues.len());
                crate::validation::VALIDATION_NOTICE.to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Remote { status, body } => {
                tracing::warn!("Places API error {}: {}", status, body);
                "External service error".to_string()
            }
            AppError::Network(msg) => {
                tracing::error!("Places API unreachable: {}", msg);
                "Network error.".to_string()
            }
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::WithContext { .. } => "Internal server error".to_string(),
        };

        if let AppError::WithContext { context, source } = &self {
            tracing::error!("Error with context: {} -> {}", context, source);
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    ///
    /// Body decoding failures come back from the store as a completed exchange,
    /// so they are reported as remote failures rather than transport ones.
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Remote {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                body: err.to_string(),
            }
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::InternalError(format!("Invalid places API URL: {}", err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type; any error that
/// converts into `AppError` (e.g. `reqwest::Error`) can be wrapped directly.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: f(),
        })
    }
}
