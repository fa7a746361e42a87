//! Note persistence

use super::{validate_title, Repository};
use crate::database::models::Note;
use crate::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

impl Repository {
    /// Create a new note
    pub async fn create_note(&self, user_id: &str, title: &str, content: &str) -> Result<Note> {
        validate_title(title)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (id, user_id, title, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(title.trim())
        .bind(content)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created note: {}", id);
        Ok(note)
    }

    /// Get a note by ID
    pub async fn get_note(&self, id: &str) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))?;

        Ok(note)
    }

    /// List a user's notes, most recently updated first
    pub async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            "SELECT * FROM notes WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    /// Update a note's title and/or content
    pub async fn update_note(
        &self,
        id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Note> {
        if let Some(title) = title {
            validate_title(title)?;
        }

        let now = Utc::now();

        let mut query = "UPDATE notes SET updated_at = ?".to_string();
        if title.is_some() {
            query.push_str(", title = ?");
        }
        if content.is_some() {
            query.push_str(", content = ?");
        }
        query.push_str(" WHERE id = ?");

        let mut q = sqlx::query(&query).bind(now);
        if let Some(title) = title {
            q = q.bind(title.trim());
        }
        if let Some(content) = content {
            q = q.bind(content);
        }
        q = q.bind(id);

        let rows_affected = q.execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NoteNotFound(id.to_string()));
        }

        self.get_note(id).await
    }

    /// Delete a note
    pub async fn delete_note(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NoteNotFound(id.to_string()));
        }

        tracing::debug!("Deleted note: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::database::repository::test_support::{create_test_repo, create_test_user};

    #[tokio::test]
    async fn test_note_crud() {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo).await;

        let note = repo
            .create_note(&user.id, "Ideas", "First draft")
            .await
            .unwrap();

        let updated = repo
            .update_note(&note.id, None, Some("Second draft"))
            .await
            .unwrap();
        assert_eq!(updated.title, "Ideas");
        assert_eq!(updated.content, "Second draft");

        repo.delete_note(&note.id).await.unwrap();
        assert!(repo.get_note(&note.id).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo).await;

        let result = repo.create_note(&user.id, "   ", "content").await;
        assert!(result.is_err());
    }
}
