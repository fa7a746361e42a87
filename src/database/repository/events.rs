//! Calendar event persistence

use super::{validate_title, Repository};
use crate::database::models::Event;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl Repository {
    /// Create a calendar event
    pub async fn create_event(
        &self,
        user_id: &str,
        title: &str,
        location: Option<&str>,
        starts_at: DateTime<Utc>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<Event> {
        validate_title(title)?;

        if let Some(end) = ends_at {
            if end < starts_at {
                return Err(AppError::Validation(
                    "Event cannot end before it starts".to_string(),
                ));
            }
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (id, user_id, title, location, starts_at, ends_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(title.trim())
        .bind(location)
        .bind(starts_at)
        .bind(ends_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created event: {}", id);
        Ok(event)
    }

    /// List a user's events in chronological order
    pub async fn list_events(&self, user_id: &str) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE user_id = ? ORDER BY starts_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Delete an event
    pub async fn delete_event(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
