//! Error types.
//!
//! Two layers:
//!
//! - [`Error`] covers infrastructure failures: binding a port, accepting a
//!   connection, loading configuration. It never reaches a client.
//! - [`ApiError`] is what a handler returns when a request cannot be served.
//!   Each variant maps to exactly one status code, and the error text becomes
//!   the plain-text response body.

use http::StatusCode;

use crate::response::{IntoResponse, Response};
use crate::store::StoreError;

/// The error type returned by the server and startup code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),
}

/// A request-level failure, rendered as an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed body, missing or invalid header, non-numeric path segment.
    #[error("{0}")]
    BadRequest(String),

    /// Identity mismatch or an author that cannot be resolved.
    #[error("{0}")]
    Unauthorized(String),

    /// Request body over the server's cap.
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// No route for this method, path shape and arity.
    #[error("not found")]
    NotFound,

    /// Any failure talking to the store, including timeouts and missing rows.
    #[error(transparent)]
    Upstream(#[from] StoreError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::NotFound => return Response::status(status),
            Self::Upstream(err) => tracing::error!(error = %err, "store call failed"),
            Self::BadRequest(msg) | Self::Unauthorized(msg) => {
                tracing::debug!(status = status.as_u16(), reason = %msg, "request rejected");
            }
            Self::PayloadTooLarge(limit) => tracing::debug!(limit, "request body too large"),
        }
        Response::builder().status(status).text(self.to_string())
    }
}
