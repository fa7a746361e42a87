//! Profile persistence

use super::Repository;
use crate::database::models::Profile;
use crate::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

impl Repository {
    /// Create a new profile
    pub async fn create_profile(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<Profile> {
        if email.trim().is_empty() {
            return Err(AppError::Validation("Email cannot be empty".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, email, display_name, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(email.trim())
        .bind(display_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created profile: {}", id);
        Ok(profile)
    }

    /// Get a profile by ID
    pub async fn get_profile(&self, id: &str) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Generic(format!("Profile not found: {}", id)))?;

        Ok(profile)
    }

    /// Look up a profile by email, if one exists
    pub async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE email = ?")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }
}
