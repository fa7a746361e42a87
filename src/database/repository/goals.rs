//! Goal persistence

use super::{validate_title, Repository};
use crate::config::DEFAULT_GOAL_PERIOD;
use crate::database::models::{CreateGoalRequest, Goal, UpdateGoalRequest};
use crate::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

impl Repository {
    /// Create a new goal. Period defaults to "short" when omitted.
    pub async fn create_goal(&self, req: CreateGoalRequest) -> Result<Goal> {
        validate_title(&req.title)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let period = req
            .period
            .unwrap_or_else(|| DEFAULT_GOAL_PERIOD.to_string());

        let goal = sqlx::query_as::<_, Goal>(
            r#"
            INSERT INTO goals (id, user_id, title, description, period, completed, target_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.user_id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(&period)
        .bind(req.target_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created goal: {}", id);
        Ok(goal)
    }

    /// Get a goal by ID
    pub async fn get_goal(&self, id: &str) -> Result<Goal> {
        let goal = sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::GoalNotFound(id.to_string()))?;

        Ok(goal)
    }

    /// List a user's goals, newest first
    pub async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let goals = sqlx::query_as::<_, Goal>(
            "SELECT * FROM goals WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(goals)
    }

    /// Update a user's goal. Only fields present in the request are
    /// changed; a goal belonging to someone else reads as not found.
    pub async fn update_goal(&self, user_id: &str, req: UpdateGoalRequest) -> Result<Goal> {
        if let Some(title) = &req.title {
            validate_title(title)?;
        }

        let now = Utc::now();

        // Build dynamic update query
        let mut query = "UPDATE goals SET updated_at = ?".to_string();

        if req.title.is_some() {
            query.push_str(", title = ?");
        }
        if req.description.is_some() {
            query.push_str(", description = ?");
        }
        if req.period.is_some() {
            query.push_str(", period = ?");
        }
        if req.completed.is_some() {
            query.push_str(", completed = ?");
        }
        if req.target_date.is_some() {
            query.push_str(", target_date = ?");
        }
        query.push_str(" WHERE id = ? AND user_id = ?");

        let mut q = sqlx::query(&query).bind(now);
        if let Some(title) = &req.title {
            q = q.bind(title.trim());
        }
        if let Some(description) = &req.description {
            q = q.bind(description);
        }
        if let Some(period) = &req.period {
            q = q.bind(period);
        }
        if let Some(completed) = req.completed {
            q = q.bind(completed);
        }
        if let Some(target_date) = req.target_date {
            q = q.bind(target_date);
        }
        q = q.bind(&req.id).bind(user_id);

        let rows_affected = q.execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::GoalNotFound(req.id));
        }

        self.get_goal(&req.id).await
    }

    /// Delete a user's goal
    pub async fn delete_goal(&self, user_id: &str, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM goals WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::GoalNotFound(id.to_string()));
        }

        tracing::debug!("Deleted goal: {}", id);
        Ok(())
    }
}
