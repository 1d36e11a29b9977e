//! Per-request deadline.
//!
//! Requests that run past the deadline are answered with the `Internal`
//! envelope. The body read observes the same deadline through
//! [`RequestDeadline`] and rejects with `BadRequest` instead.

use std::time::Duration;

use axum::{
    extract::Request,
    http::{Method, Uri},
    BoxError,
};
use tokio::time::Instant;
use tower::timeout::error::Elapsed;

use crate::error::AppError;

/// Instant by which the current request must be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDeadline(pub Instant);

/// Record the deadline on the request. Runs before the timeout timer starts,
/// so anything waiting on the stamp fires no later than the timeout itself.
pub(crate) fn stamp(limit: Duration) -> impl Fn(Request) -> Request + Clone + Send + Sync {
    move |mut request: Request| {
        request
            .extensions_mut()
            .insert(RequestDeadline(Instant::now() + limit));
        request
    }
}

pub(crate) async fn deadline_exceeded(method: Method, uri: Uri, err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Internal(anyhow::anyhow!("{method} {uri} exceeded the request deadline"))
    } else {
        AppError::Internal(anyhow::anyhow!("{method} {uri} failed in middleware: {err}"))
    }
}
