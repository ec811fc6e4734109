//! Request-context error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures surfaced when a caller demands identity, session, or request data.
///
/// All variants are per-request outcomes. None of them are logged where they
/// are produced; the caller decides.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The logical context never passed through the propagation middleware.
    #[error("request context is missing")]
    ContextMissing,

    /// No identity header was supplied by the gateway.
    #[error("user not authenticated")]
    Unauthenticated,

    /// No session payload was supplied by the gateway.
    #[error("session data not available")]
    SessionUnavailable,

    /// A session payload was supplied but does not match the session shape.
    #[error("invalid session data: {0}")]
    InvalidSessionData(#[source] serde_json::Error),

    /// The context was built without a raw request snapshot.
    #[error("raw request not available")]
    NotAvailable,

    /// A credential cannot be represented as an HTTP header value.
    #[error("credential is not a valid header value")]
    InvalidHeaderValue(#[from] axum::http::header::InvalidHeaderValue),

    /// A cookie value holds bytes outside the cookie-octet set.
    #[error("invalid value for cookie {0}")]
    InvalidCookieValue(&'static str),
}

/// Result type for request-context operations.
pub type ContextResult<T> = Result<T, ContextError>;

impl ContextError {
    /// HTTP status a handler should answer with when this error escapes it.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ContextError::Unauthenticated | ContextError::SessionUnavailable => {
                StatusCode::UNAUTHORIZED
            }
            // The gateway sent something we cannot read: upstream contract drift.
            ContextError::InvalidSessionData(_) => StatusCode::BAD_GATEWAY,
            ContextError::ContextMissing
            | ContextError::NotAvailable
            | ContextError::InvalidHeaderValue(_)
            | ContextError::InvalidCookieValue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ContextError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
