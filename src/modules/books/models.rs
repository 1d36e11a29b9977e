use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Server-assigned identifier, never reused or changed
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Set once at insert
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Refreshed by every successful update
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Request body for create and update. Missing fields decode as empty strings
/// so they fail validation with the same message as blank ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

/// Validated title/author pair; only obtainable through [`BookPayload::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInput {
    title: String,
    author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("title and author are required")]
pub struct MissingFields;

impl BookPayload {
    pub fn validate(self) -> Result<BookInput, MissingFields> {
        if self.title.is_empty() || self.author.is_empty() {
            return Err(MissingFields);
        }
        Ok(BookInput {
            title: self.title,
            author: self.author,
        })
    }
}

impl BookInput {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}
