//! Error handling for the bookshelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response;

/// Message returned to clients for every internal failure
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            AppError::BadRequest(message) | AppError::NotFound(message) => {
                tracing::debug!(status_code = status.as_u16(), %message, "request rejected");
                message
            }
            AppError::MethodNotAllowed => {
                tracing::debug!(status_code = status.as_u16(), "method not allowed");
                "method not allowed".to_string()
            }
            // The cause stays in the server log; clients only see the generic message.
            AppError::Internal(cause) => {
                tracing::error!(
                    status_code = status.as_u16(),
                    error = ?cause,
                    "internal error"
                );
                INTERNAL_MESSAGE.to_string()
            }
        };

        response::error(status, message)
    }
}
