//! HTTP routes for the books module.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bookshelf_http::{
    extract::{JsonBody, PathId},
    response, AppError,
};

use super::models::{BookPayload, MissingFields};
use super::repository::{BookRepository, RepositoryError};

/// Shared handler state: the injected repository
#[derive(Clone)]
pub struct BooksState {
    repo: Arc<dyn BookRepository>,
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => AppError::not_found("book not found"),
            RepositoryError::Internal(cause) => {
                AppError::Internal(cause.context("book storage failure"))
            }
        }
    }
}

impl From<MissingFields> for AppError {
    fn from(err: MissingFields) -> Self {
        AppError::bad_request(err.to_string())
    }
}

/// `/books` and `/books/{id}` bound to `repo`
pub fn router(repo: Arc<dyn BookRepository>) -> Router {
    Router::new()
        .route(
            "/books",
            get(list_books)
                .post(create_book)
                .fallback(collection_method_not_allowed),
        )
        .route(
            "/books/{id}",
            get(get_book)
                .put(update_book)
                .delete(delete_book)
                .fallback(item_method_not_allowed),
        )
        .with_state(BooksState { repo })
}

async fn list_books(State(state): State<BooksState>) -> Result<Response, AppError> {
    let books = state.repo.list().await?;
    Ok(response::json(StatusCode::OK, &books))
}

async fn create_book(
    State(state): State<BooksState>,
    JsonBody(payload): JsonBody<BookPayload>,
) -> Result<Response, AppError> {
    let input = payload.validate()?;
    let book = state.repo.create(&input).await?;

    tracing::info!(book_id = book.id, "book created");
    Ok(response::json(StatusCode::CREATED, &book))
}

async fn get_book(
    State(state): State<BooksState>,
    PathId(id): PathId,
) -> Result<Response, AppError> {
    let book = state.repo.get(id).await?;
    Ok(response::json(StatusCode::OK, &book))
}

async fn update_book(
    State(state): State<BooksState>,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<BookPayload>,
) -> Result<Response, AppError> {
    let input = payload.validate()?;
    let book = state.repo.update(id, &input).await?;

    tracing::info!(book_id = book.id, "book updated");
    Ok(response::json(StatusCode::OK, &book))
}

async fn delete_book(
    State(state): State<BooksState>,
    PathId(id): PathId,
) -> Result<Response, AppError> {
    state.repo.delete(id).await?;

    tracing::info!(book_id = id, "book deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

const COLLECTION_METHODS: &str = "GET, POST";
const ITEM_METHODS: &str = "GET, PUT, DELETE";

async fn collection_method_not_allowed() -> impl IntoResponse {
    ([(header::ALLOW, COLLECTION_METHODS)], AppError::MethodNotAllowed)
}

/// The id is still validated first, so a bad id wins over a bad method.
async fn item_method_not_allowed(PathId(_): PathId) -> impl IntoResponse {
    ([(header::ALLOW, ITEM_METHODS)], AppError::MethodNotAllowed)
}
