//! Error types and their HTTP rendering.
//!
//! Every failure that can reach a client, whether a middleware rejection, a
//! validation problem or a missing item, is an [`Error`]. Errors carry an
//! [`ErrorKind`] that decides both the HTTP status and the stable error code,
//! and they render themselves as a JSON [`ErrorResponse`].
//!
//! # Design
//!
//! `Error` is opaque and paired with an `ErrorKind` enum, the same way
//! `std::io::Error` works. The source error can change without breaking
//! callers that only match on the kind.
//!
//! # Example
//!
//! ```rust
//! use axum_hardened::{Error, ErrorKind};
//! use axum::http::StatusCode;
//!
//! let error = Error::not_found("No item exists with the provided identifier.");
//! assert_eq!(error.kind(), ErrorKind::NotFound);
//! assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
//! assert_eq!(error.error_code(), "NOT_FOUND");
//! ```

use crate::utils::format_bytes;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The kind of error that occurred.
///
/// # Stability
///
/// This enum is `#[non_exhaustive]`. Always include a wildcard arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed request (blocked header, failed validation of params, query or body).
    #[error("bad request")]
    BadRequest,

    /// Invalid input outside of a request (bad URL, header value, config value).
    #[error("invalid input")]
    InvalidInput,

    /// Request refused, e.g. a disallowed CORS origin.
    #[error("forbidden")]
    Forbidden,

    /// Unknown route or missing resource.
    #[error("not found")]
    NotFound,

    /// HTTP method not accepted by the server or the route.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Request did not complete in time.
    #[error("request timeout")]
    RequestTimeout,

    /// Request body larger than the configured limit.
    #[error("payload too large")]
    PayloadTooLarge,

    /// Content-Type missing, forbidden or not in the allowed set.
    #[error("unsupported media type")]
    UnsupportedMediaType,

    /// Semantically invalid entity.
    #[error("validation error")]
    Validation,

    /// Client exceeded the rate limit.
    #[error("rate limited")]
    RateLimited,

    /// Too many headers, or headers too large.
    #[error("request header fields too large")]
    HeaderFieldsTooLarge,

    /// A response failed validation before being sent.
    #[error("output validation error")]
    OutputValidation,

    /// Chunked transfer encoding when it is disabled.
    #[error("unsupported transfer encoding")]
    UnsupportedTransferEncoding,

    /// The service is not ready to handle requests.
    #[error("service unavailable")]
    ServiceUnavailable,

    /// Database error (connection, query, pool issues).
    #[error("database error")]
    Database,

    /// Configuration error (invalid TOML, missing values).
    #[error("configuration error")]
    Configuration,

    /// I/O error (file operations, network).
    #[error("I/O error")]
    Io,

    /// A lifecycle service failed to start.
    #[error("lifecycle error")]
    Lifecycle,

    /// Internal/unexpected error.
    #[error("internal error")]
    Internal,
}

/// An error that can occur anywhere in the service.
///
/// Use [`Error::kind()`] to match on the category and `Display` for the
/// human-readable message sent to clients.
///
/// ```rust
/// use axum_hardened::Error;
///
/// let err = Error::bad_request("Param validation failed: Invalid ID format");
/// let err = Error::rate_limited(200, std::time::Duration::from_secs(60));
/// let err = Error::internal("unexpected state");
/// ```
pub struct Error {
    kind: ErrorKind,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Creates a new error with the given kind and source.
    ///
    /// ```rust
    /// use axum_hardened::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::Internal, "something went wrong");
    /// assert_eq!(err.kind(), ErrorKind::Internal);
    /// ```
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            kind,
            source: error.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the stable error code string for this error.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorKind::RequestTimeout => "REQUEST_TIMEOUT",
            ErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::HeaderFieldsTooLarge => "HEADER_FIELDS_TOO_LARGE",
            ErrorKind::OutputValidation => "OUTPUT_VALIDATION_ERROR",
            ErrorKind::UnsupportedTransferEncoding => "UNSUPPORTED_TRANSFER_ENCODING",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::Database => "DATABASE_ERROR",
            ErrorKind::Configuration => "CONFIG_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::Lifecycle => "LIFECYCLE_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::BadRequest | ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::HeaderFieldsTooLarge => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            ErrorKind::OutputValidation => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::UnsupportedTransferEncoding => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::ServiceUnavailable | ErrorKind::Database => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Configuration
            | ErrorKind::Io
            | ErrorKind::Lifecycle
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true for kinds whose message describes the server itself
    /// (database, filesystem, configuration, bugs) rather than the request.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Database
                | ErrorKind::Configuration
                | ErrorKind::Io
                | ErrorKind::Lifecycle
                | ErrorKind::OutputValidation
                | ErrorKind::Internal
        )
    }

    /// Converts the error into a structured error response.
    ///
    /// Server faults only carry the status reason phrase, e.g. "Internal
    /// Server Error". Their message stays in the logs.
    pub fn to_error_response(&self) -> ErrorResponse {
        let status = self.status_code();
        let message = if self.is_server_fault() {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_owned()
        } else {
            self.to_string()
        };
        ErrorResponse::new(self.error_code(), status, message)
    }

    /// Consumes the error and returns the inner error source.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.source
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Error {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg.into())
    }

    /// Creates a 404 for a request that matched no route.
    pub fn route_not_found(method: &http::Method, uri: &http::Uri) -> Self {
        Self::not_found(format!(
            "Route not found: no route matches {method} {uri}."
        ))
    }

    /// Creates a 405 naming the rejected method.
    pub fn method_not_allowed(method: &http::Method) -> Self {
        Self::new(
            ErrorKind::MethodNotAllowed,
            format!("HTTP method '{method}' is not allowed on this server."),
        )
    }

    pub fn request_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestTimeout, msg.into())
    }

    /// Creates a 413 mentioning the human-readable limit.
    pub fn payload_too_large(limit: u64) -> Self {
        Self::new(
            ErrorKind::PayloadTooLarge,
            format!(
                "Request body exceeds maximum allowed size (limit = {}).",
                format_bytes(limit)
            ),
        )
    }

    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedMediaType, msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg.into())
    }

    /// Creates a 429 describing the sliding window.
    pub fn rate_limited(max_requests: u32, window: std::time::Duration) -> Self {
        Self::new(
            ErrorKind::RateLimited,
            format!(
                "Too many requests: limit is {max_requests} per {}s.",
                window.as_secs()
            ),
        )
    }

    pub fn header_fields_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::HeaderFieldsTooLarge, msg.into())
    }

    pub fn output_validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutputValidation, msg.into())
    }

    pub fn unsupported_transfer_encoding(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedTransferEncoding, msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, msg.into())
    }

    /// Creates a `Database` kind error with a "Database configuration error" prefix.
    pub fn database_config(msg: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Database,
            format!("Database configuration error: {}", msg.into()),
        )
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg.into())
    }

    /// Creates a lifecycle error naming the service that failed.
    pub fn lifecycle(service: &str, msg: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::Lifecycle,
            format!("Failed to start service {service}: {msg}"),
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg.into())
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = self.to_error_response();

        if status.is_server_error() {
            tracing::error!(
                error_code = %error_response.error_code,
                message = %self,
                status = %status.as_u16(),
                "Error occurred"
            );
        } else {
            tracing::debug!(
                error_code = %error_response.error_code,
                message = %error_response.message,
                status = %status.as_u16(),
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Internal, err)
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::new(ErrorKind::Database, err)
    }
}

// ============================================================================
// ErrorResponse
// ============================================================================

/// JSON body of every error response.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Stable error code for client-side handling.
    pub error_code: String,
    /// HTTP status code, repeated in the body.
    pub status: u16,
    /// Human-readable error message.
    pub message: String,
    /// Milliseconds since the Unix epoch when the error was produced.
    pub timestamp: i64,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            status: status.as_u16(),
            message: message.into(),
            timestamp: crate::utils::unix_millis(),
        }
    }
}
