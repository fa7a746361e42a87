//! Reading list service
//!
//! Book search goes through the external "search-books" function; adds
//! reuse an existing catalog row when one matches the title so the
//! shared catalog never grows duplicates.

use crate::config::READING_STATUS_TO_READ;
use crate::database::{Book, ReadingEntry, Repository};
use crate::error::Result;
use crate::functions::{BookSummary, FunctionsClient};

/// Service for the book catalog and per-user reading list
#[derive(Clone)]
pub struct ReadingService {
    repo: Repository,
    functions: FunctionsClient,
}

impl ReadingService {
    pub fn new(repo: Repository, functions: FunctionsClient) -> Self {
        Self { repo, functions }
    }

    /// Search the external book catalog
    pub async fn search(&self, query: &str, language: &str) -> Result<Vec<BookSummary>> {
        self.functions.search_books(query, language, None).await
    }

    /// Add a book to the user's reading list with status "to read".
    ///
    /// The catalog row is found by title or created; the reading-list
    /// entry is always created, so several users (or repeat adds) can
    /// track the same title against one catalog row.
    pub async fn add_to_list(
        &self,
        user_id: &str,
        title: &str,
        author: Option<&str>,
    ) -> Result<(Book, ReadingEntry)> {
        let book = match self.repo.find_book_by_title(title).await? {
            Some(existing) => {
                tracing::debug!("Reusing catalog book: {}", existing.id);
                existing
            }
            None => self.repo.create_book(title, author, None).await?,
        };

        let entry = self
            .repo
            .add_reading_entry(user_id, &book.id, READING_STATUS_TO_READ)
            .await?;

        Ok((book, entry))
    }

    /// The user's reading list
    pub async fn list(&self, user_id: &str) -> Result<Vec<ReadingEntry>> {
        self.repo.list_reading_entries(user_id).await
    }
}
