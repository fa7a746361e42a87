//! Task persistence

use super::{validate_title, Repository};
use crate::database::models::{CreateTaskRequest, Task, UpdateTaskRequest};
use crate::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

impl Repository {
    /// Create a new task
    pub async fn create_task(&self, req: CreateTaskRequest) -> Result<Task> {
        validate_title(&req.title)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, user_id, title, description, completed, due_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.user_id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(req.due_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created task: {}", id);
        Ok(task)
    }

    /// Get a task by ID
    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))?;

        Ok(task)
    }

    /// List a user's tasks, newest first
    pub async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    /// Update a user's task. Only fields present in the request are
    /// changed; a task belonging to someone else reads as not found.
    pub async fn update_task(&self, user_id: &str, req: UpdateTaskRequest) -> Result<Task> {
        if let Some(title) = &req.title {
            validate_title(title)?;
        }

        let now = Utc::now();

        // Build dynamic update query
        let mut query = "UPDATE tasks SET updated_at = ?".to_string();

        if req.title.is_some() {
            query.push_str(", title = ?");
        }
        if req.description.is_some() {
            query.push_str(", description = ?");
        }
        if req.completed.is_some() {
            query.push_str(", completed = ?");
        }
        if req.due_date.is_some() {
            query.push_str(", due_date = ?");
        }
        query.push_str(" WHERE id = ? AND user_id = ?");

        let mut q = sqlx::query(&query).bind(now);
        if let Some(title) = &req.title {
            q = q.bind(title.trim());
        }
        if let Some(description) = &req.description {
            q = q.bind(description);
        }
        if let Some(completed) = req.completed {
            q = q.bind(completed);
        }
        if let Some(due_date) = req.due_date {
            q = q.bind(due_date);
        }
        q = q.bind(&req.id).bind(user_id);

        let rows_affected = q.execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::TaskNotFound(req.id));
        }

        self.get_task(&req.id).await
    }

    /// Delete a user's task
    pub async fn delete_task(&self, user_id: &str, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::TaskNotFound(id.to_string()));
        }

        tracing::debug!("Deleted task: {}", id);
        Ok(())
    }
}
