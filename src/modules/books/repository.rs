//! Persistence for book records.

use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{Book, BookInput};

/// Failure outcomes of a repository call
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("book {0} not found")]
    NotFound(i64),

    #[error("book storage failure")]
    Internal(#[source] anyhow::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage operations for books. Each call is a single atomic statement.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books, ascending by id
    async fn list(&self) -> RepositoryResult<Vec<Book>>;

    async fn get(&self, id: i64) -> RepositoryResult<Book>;

    /// Insert a book; the store assigns the id and both timestamps
    async fn create(&self, input: &BookInput) -> RepositoryResult<Book>;

    /// Replace title and author, refreshing `updated_at`
    async fn update(&self, id: i64, input: &BookInput) -> RepositoryResult<Book>;

    async fn delete(&self, id: i64) -> RepositoryResult<()>;
}

const SELECT_ALL: &str = "SELECT id, title, author, created_at, updated_at FROM books ORDER BY id";

const SELECT_ONE: &str =
    "SELECT id, title, author, created_at, updated_at FROM books WHERE id = $1";

const INSERT: &str = "INSERT INTO books (title, author) VALUES ($1, $2) \
     RETURNING id, title, author, created_at, updated_at";

const UPDATE: &str = "UPDATE books SET title = $1, author = $2, updated_at = NOW() WHERE id = $3 \
     RETURNING id, title, author, created_at, updated_at";

const DELETE: &str = "DELETE FROM books WHERE id = $1";

/// PostgreSQL-backed repository over a shared connection pool
#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn list(&self) -> RepositoryResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get(&self, id: i64) -> RepositoryResult<Book> {
        sqlx::query_as::<_, Book>(SELECT_ONE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn create(&self, input: &BookInput) -> RepositoryResult<Book> {
        let book = sqlx::query_as::<_, Book>(INSERT)
            .bind(input.title())
            .bind(input.author())
            .fetch_one(&self.pool)
            .await?;
        Ok(book)
    }

    async fn update(&self, id: i64, input: &BookInput) -> RepositoryResult<Book> {
        sqlx::query_as::<_, Book>(UPDATE)
            .bind(input.title())
            .bind(input.author())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query(DELETE).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}
