//! Book catalog and reading-list persistence
//!
//! Books form a shared catalog de-duplicated by title; reading-list rows
//! link a user to a catalog book, so many users can track the same title.

use super::{validate_title, Repository};
use crate::database::models::{Book, ReadingEntry};
use crate::error::Result;
use chrono::Utc;
use uuid::Uuid;

impl Repository {
    /// Look up a catalog book by title, case-insensitively
    pub async fn find_book_by_title(&self, title: &str) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE LOWER(title) = LOWER(?) LIMIT 1",
        )
        .bind(title.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Create a catalog book
    pub async fn create_book(
        &self,
        title: &str,
        author: Option<&str>,
        cover_url: Option<&str>,
    ) -> Result<Book> {
        validate_title(title)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, cover_url, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(title.trim())
        .bind(author)
        .bind(cover_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created book: {} ({})", book.title, id);
        Ok(book)
    }

    /// List the whole catalog
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Add a reading-list entry linking a user to a catalog book
    pub async fn add_reading_entry(
        &self,
        user_id: &str,
        book_id: &str,
        status: &str,
    ) -> Result<ReadingEntry> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let entry = sqlx::query_as::<_, ReadingEntry>(
            r#"
            INSERT INTO reading_list (id, user_id, book_id, status, added_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(book_id)
        .bind(status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Added reading entry: {} for book {}", id, book_id);
        Ok(entry)
    }

    /// List a user's reading list, newest first
    pub async fn list_reading_entries(&self, user_id: &str) -> Result<Vec<ReadingEntry>> {
        let entries = sqlx::query_as::<_, ReadingEntry>(
            "SELECT * FROM reading_list WHERE user_id = ? ORDER BY added_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use crate::database::repository::test_support::{create_test_repo, create_test_user};

    #[tokio::test]
    async fn test_book_lookup_is_case_insensitive() {
        let repo = create_test_repo().await;

        repo.create_book("Dune", Some("Herbert"), None).await.unwrap();

        let found = repo.find_book_by_title("dune").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().title, "Dune");

        let missing = repo.find_book_by_title("Hyperion").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_reading_entries() {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo).await;

        let book = repo.create_book("Dune", Some("Herbert"), None).await.unwrap();
        let entry = repo
            .add_reading_entry(&user.id, &book.id, "to_read")
            .await
            .unwrap();

        assert_eq!(entry.status, "to_read");

        let entries = repo.list_reading_entries(&user.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].book_id, book.id);
    }
}
