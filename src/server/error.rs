//! Error types for the HTTP server
//!
//! `ApiError` is terminal for a single request and always renders the same
//! generic 500 body. `ServerError` is terminal for the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::error;

/// Body returned for every unhandled request fault
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Fault raised while handling a request
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Detail stays in the log, the caller only sees the generic body
        error!(error = %self, "Unhandled error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: INTERNAL_ERROR_MESSAGE,
            }),
        )
            .into_response()
    }
}

/// Convert a handler panic into the generic 500 response
///
/// Installed through `CatchPanicLayer::custom`.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::Internal(message).into_response()
}
