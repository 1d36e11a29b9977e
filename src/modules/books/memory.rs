//! In-process repository used where no database is available, mainly tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use super::models::{Book, BookInput};
use super::repository::{BookRepository, RepositoryError, RepositoryResult};

#[derive(Default)]
struct State {
    next_id: i64,
    books: BTreeMap<i64, Book>,
}

/// Map-backed repository with the same ordering and timestamp rules as the SQL one
#[derive(Default)]
pub struct InMemoryBookRepository {
    state: RwLock<State>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.books.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Store timestamps at microsecond precision, like a `TIMESTAMPTZ` column.
fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn list(&self) -> RepositoryResult<Vec<Book>> {
        Ok(self.state.read().await.books.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> RepositoryResult<Book> {
        self.state
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn create(&self, input: &BookInput) -> RepositoryResult<Book> {
        let mut state = self.state.write().await;
        state.next_id += 1;

        let created_at = now();
        let book = Book {
            id: state.next_id,
            title: input.title().to_string(),
            author: input.author().to_string(),
            created_at,
            updated_at: created_at,
        };
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: i64, input: &BookInput) -> RepositoryResult<Book> {
        let mut state = self.state.write().await;
        let book = state
            .books
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;

        book.title = input.title().to_string();
        book.author = input.author().to_string();
        // Two writes inside the same microsecond still move the clock forward.
        book.updated_at = now().max(book.updated_at + Duration::microseconds(1));
        Ok(book.clone())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        self.state
            .write()
            .await
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::BookPayload;

    fn input(title: &str, author: &str) -> BookInput {
        BookPayload {
            title: title.to_string(),
            author: author.to_string(),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let repo = InMemoryBookRepository::new();
        let created = repo.create(&input("Dune", "Herbert")).await.unwrap();

        let fetched = repo.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn update_advances_updated_at_only() {
        let repo = InMemoryBookRepository::new();
        let created = repo.create(&input("Dune", "Herbert")).await.unwrap();

        let updated = repo
            .update(created.id, &input("Dune", "F. Herbert"))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.author, "F. Herbert");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = InMemoryBookRepository::new();
        let first = repo.create(&input("A", "a")).await.unwrap();
        repo.delete(first.id).await.unwrap();

        let second = repo.create(&input("B", "b")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let repo = InMemoryBookRepository::new();
        assert!(matches!(repo.get(9).await, Err(RepositoryError::NotFound(9))));
        assert!(matches!(
            repo.update(9, &input("A", "a")).await,
            Err(RepositoryError::NotFound(9))
        ));
        assert!(matches!(repo.delete(9).await, Err(RepositoryError::NotFound(9))));
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let repo = InMemoryBookRepository::new();
        assert!(repo.list().await.unwrap().is_empty());

        for title in ["C", "A", "B"] {
            repo.create(&input(title, "x")).await.unwrap();
        }

        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
