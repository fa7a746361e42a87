//! Repository layer for database operations
//!
//! CRUD operations for all entities, one file per entity family.
//! Partial updates only touch fields present in the request.

mod books;
mod events;
mod goals;
mod habits;
mod notes;
mod profiles;
mod shopping;
mod tasks;

use crate::config::MAX_TITLE_LENGTH;
use crate::error::{AppError, Result};
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pub(crate) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Reject empty or oversized display titles before touching the database.
pub(crate) fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Title cannot be empty".to_string()));
    }
    if trimmed.len() > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "Title exceeds {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}
