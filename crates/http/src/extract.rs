//! Request extractors that reject with the JSON error envelope.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::{deadline::RequestDeadline, error::AppError};

/// JSON request body decoded regardless of the `Content-Type` header.
///
/// Only the first JSON value is read; anything after it is ignored. The read
/// gives up at the request deadline, when one is set.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let deadline = req.extensions().get::<RequestDeadline>().copied();
        let read = Bytes::from_request(req, state);

        let body = match deadline {
            Some(RequestDeadline(at)) => tokio::time::timeout_at(at, read).await.map_err(|_| {
                tracing::debug!("request body read hit the deadline");
                AppError::bad_request("request body read timed out")
            })?,
            None => read.await,
        };

        let bytes = body.map_err(|rejection| {
            tracing::debug!(error = %rejection, "failed to read request body");
            AppError::bad_request("invalid request body")
        })?;

        match serde_json::Deserializer::from_slice(&bytes)
            .into_iter::<T>()
            .next()
        {
            Some(Ok(value)) => Ok(JsonBody(value)),
            _ => Err(AppError::bad_request("invalid JSON")),
        }
    }
}

/// Single `{id}` path segment parsed as a base-10 `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i64);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("invalid id"))?;

        parse_id(&raw).map(PathId)
    }
}

pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::bad_request("invalid id"))
}
