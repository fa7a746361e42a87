//! Error types for the Lifedesk engine
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the frontend.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Habit not found: {0}")]
    HabitNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Goal not found: {0}")]
    GoalNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("You must be signed in to do that")]
    Unauthorized,

    #[error("{0}")]
    Generic(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
