//! API error types and responses.

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use backup_hook_core::ErrorResponse;

use crate::runner::RunError;

/// Authentication failures.
///
/// Only these two categories reach the caller; why a signature failed to
/// verify is never disclosed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `X-Signature` header, or an empty one.
    #[error("Missing signature")]
    MissingSignature,

    /// The signature does not match the body.
    #[error("Invalid signature")]
    InvalidSignature,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Any method other than `POST` on the hook endpoint.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),

    /// Missing or invalid signature.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// Signed body is not a valid request envelope.
    #[error("malformed body: {0}")]
    MalformedBody(String),

    /// An argument cannot be passed to a process.
    #[error("argument {index} contains a NUL byte")]
    InvalidArgument {
        /// Position of the offending argument.
        index: usize,
    },

    /// Body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Body stream failed before completion.
    #[error("failed to read request body: {0}")]
    UnreadableBody(String),

    /// No backup slot can be acquired (the slot pool was closed).
    #[error("backup slots unavailable")]
    Unavailable,

    /// The backup script could not be run or did not succeed.
    #[error("backup script failed: {0}")]
    Execution(#[from] RunError),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::MalformedBody(_) | Self::InvalidArgument { .. } | Self::UnreadableBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller.
    ///
    /// Never includes script output, paths or parser internals.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed(_) => "Method not allowed",
            Self::Unauthorized(AuthError::MissingSignature) => "Missing signature",
            Self::Unauthorized(AuthError::InvalidSignature) => "Invalid signature",
            Self::MalformedBody(_) => "Invalid JSON in request body",
            Self::InvalidArgument { .. } => "Arguments must not contain NUL bytes",
            Self::PayloadTooLarge { .. } => "Request body too large",
            Self::UnreadableBody(_) => "Failed to read request body",
            Self::Unavailable => "Backup service unavailable",
            Self::Execution(RunError::TimedOut { .. }) => "Backup script timed out",
            Self::Execution(_) => "Backup script failed",
        }
    }

    fn log(&self) {
        match self {
            Self::MethodNotAllowed(method) => {
                tracing::debug!(method = %method, "Rejected request with unsupported method");
            }
            Self::Unauthorized(reason) => {
                tracing::warn!(reason = %reason, "Rejected unauthenticated backup request");
            }
            Self::MalformedBody(detail) => {
                tracing::warn!(error = %detail, "Rejected signed request with malformed body");
            }
            Self::InvalidArgument { index } => {
                tracing::warn!(index, "Rejected argument containing NUL byte");
            }
            Self::PayloadTooLarge { limit } => {
                tracing::warn!(limit, "Rejected oversized request body");
            }
            Self::UnreadableBody(detail) => {
                tracing::warn!(error = %detail, "Failed to read request body");
            }
            Self::Unavailable => {
                tracing::error!("Backup slot pool closed");
            }
            Self::Execution(err) => {
                tracing::error!(
                    error = %err,
                    exit_code = ?err.exit_code(),
                    output = %String::from_utf8_lossy(err.output()),
                    "Backup script failed"
                );
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let body = ErrorResponse {
            error: self.public_message().to_string(),
        };
        let mut response = (self.status(), Json(body)).into_response();

        if matches!(self, Self::MethodNotAllowed(_)) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }

        response
    }
}
