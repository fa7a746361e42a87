//! Habit and habit-history persistence
//!
//! Habit rows carry the user-defined `"order"` position. History rows are
//! keyed on (habit_id, date) and upserted: a new check for an existing date
//! replaces the prior entry, never duplicates it.

use super::{validate_title, Repository};
use crate::config::{DEFAULT_CHECKS_PER_DAY, NOTIFICATION_TIME_FORMAT};
use crate::database::models::{
    CreateHabitRequest, Habit, HabitCheck, TrackingType, UpdateHabitRequest,
};
use crate::error::{AppError, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

/// Validate an "HH:MM" wall-clock string.
fn validate_notification_time(time: &str) -> Result<()> {
    NaiveTime::parse_from_str(time, NOTIFICATION_TIME_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid notification time: {}", time)))?;
    Ok(())
}

impl Repository {
    /// Create a new habit, appended at the end of the user's list
    pub async fn create_habit(&self, req: CreateHabitRequest) -> Result<Habit> {
        validate_title(&req.title)?;

        match req.tracking_type {
            TrackingType::Amount if req.amount_target.unwrap_or(0.0) <= 0.0 => {
                return Err(AppError::Validation(
                    "Amount-tracked habits need a positive target".to_string(),
                ));
            }
            TrackingType::Time if req.time_target.unwrap_or(0.0) <= 0.0 => {
                return Err(AppError::Validation(
                    "Time-tracked habits need a positive target".to_string(),
                ));
            }
            _ => {}
        }

        let checks_per_day = req.checks_per_day.unwrap_or(DEFAULT_CHECKS_PER_DAY);
        if checks_per_day < 1 {
            return Err(AppError::Validation(
                "Checks per day must be at least 1".to_string(),
            ));
        }

        if req.notification_enabled {
            match req.notification_time.as_deref() {
                Some(time) => validate_notification_time(time)?,
                None => {
                    return Err(AppError::Validation(
                        "Notification time is required when notifications are enabled"
                            .to_string(),
                    ));
                }
            }
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        // Append after the user's current maximum position
        let next_order: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(MAX("order") + 1, 0) FROM habits WHERE user_id = ?"#,
        )
        .bind(&req.user_id)
        .fetch_one(&self.pool)
        .await?;

        let habit = sqlx::query_as::<_, Habit>(
            r#"
            INSERT INTO habits (
                id, user_id, title, habit_type, tracking_type, checks_per_day,
                amount_target, time_target, emoji, color, repeat_days, "order",
                notification_enabled, notification_time, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.user_id)
        .bind(req.title.trim())
        .bind(req.habit_type)
        .bind(req.tracking_type)
        .bind(checks_per_day)
        .bind(req.amount_target)
        .bind(req.time_target)
        .bind(&req.emoji)
        .bind(&req.color)
        .bind(&req.repeat_days)
        .bind(next_order)
        .bind(req.notification_enabled)
        .bind(&req.notification_time)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created habit: {}", id);
        Ok(habit)
    }

    /// Get a habit by ID
    pub async fn get_habit(&self, id: &str) -> Result<Habit> {
        let habit = sqlx::query_as::<_, Habit>("SELECT * FROM habits WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::HabitNotFound(id.to_string()))?;

        Ok(habit)
    }

    /// List a user's habits in their chosen order
    pub async fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>> {
        let habits = sqlx::query_as::<_, Habit>(
            r#"
            SELECT * FROM habits
            WHERE user_id = ?
            ORDER BY "order" ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(habits)
    }

    /// Update a habit. Only fields present in the request are changed.
    pub async fn update_habit(&self, req: UpdateHabitRequest) -> Result<Habit> {
        if let Some(title) = &req.title {
            validate_title(title)?;
        }
        if let Some(time) = &req.notification_time {
            validate_notification_time(time)?;
        }

        // Build dynamic update query
        let mut query = "UPDATE habits SET id = id".to_string();

        if req.title.is_some() {
            query.push_str(", title = ?");
        }
        if req.checks_per_day.is_some() {
            query.push_str(", checks_per_day = ?");
        }
        if req.amount_target.is_some() {
            query.push_str(", amount_target = ?");
        }
        if req.time_target.is_some() {
            query.push_str(", time_target = ?");
        }
        if req.emoji.is_some() {
            query.push_str(", emoji = ?");
        }
        if req.color.is_some() {
            query.push_str(", color = ?");
        }
        if req.repeat_days.is_some() {
            query.push_str(", repeat_days = ?");
        }
        if req.notification_enabled.is_some() {
            query.push_str(", notification_enabled = ?");
        }
        if req.notification_time.is_some() {
            query.push_str(", notification_time = ?");
        }
        query.push_str(" WHERE id = ?");

        // Bind in the same order the fragments were pushed
        let mut q = sqlx::query(&query);
        if let Some(title) = &req.title {
            q = q.bind(title.trim());
        }
        if let Some(checks) = req.checks_per_day {
            q = q.bind(checks);
        }
        if let Some(target) = req.amount_target {
            q = q.bind(target);
        }
        if let Some(target) = req.time_target {
            q = q.bind(target);
        }
        if let Some(emoji) = &req.emoji {
            q = q.bind(emoji);
        }
        if let Some(color) = &req.color {
            q = q.bind(color);
        }
        if let Some(days) = &req.repeat_days {
            q = q.bind(days);
        }
        if let Some(enabled) = req.notification_enabled {
            q = q.bind(enabled);
        }
        if let Some(time) = &req.notification_time {
            q = q.bind(time);
        }
        q = q.bind(&req.id);

        let rows_affected = q.execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::HabitNotFound(req.id));
        }

        self.get_habit(&req.id).await
    }

    /// Delete a habit. History rows cascade.
    pub async fn delete_habit(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM habits WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::HabitNotFound(id.to_string()));
        }

        tracing::debug!("Deleted habit: {}", id);
        Ok(())
    }

    /// Persist a full set of (habit id, position) pairs in one transaction.
    /// Either every position is written or none is.
    pub async fn update_habit_orders(&self, orders: &[(String, i64)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (id, order) in orders {
            sqlx::query(r#"UPDATE habits SET "order" = ? WHERE id = ?"#)
                .bind(order)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!("Persisted order for {} habits", orders.len());
        Ok(())
    }

    /// Write a check entry, replacing any prior entry for the same date
    pub async fn upsert_check(&self, check: &HabitCheck) -> Result<HabitCheck> {
        let stored = sqlx::query_as::<_, HabitCheck>(
            r#"
            INSERT INTO habit_history (habit_id, user_id, date, completed, failed, amount, time)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(habit_id, date) DO UPDATE SET
                completed = excluded.completed,
                failed = excluded.failed,
                amount = excluded.amount,
                time = excluded.time
            RETURNING *
            "#,
        )
        .bind(&check.habit_id)
        .bind(&check.user_id)
        .bind(check.date)
        .bind(check.completed)
        .bind(check.failed)
        .bind(check.amount)
        .bind(check.time)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Get the check entry for one date, if any
    pub async fn get_check(&self, habit_id: &str, date: NaiveDate) -> Result<Option<HabitCheck>> {
        let check = sqlx::query_as::<_, HabitCheck>(
            "SELECT * FROM habit_history WHERE habit_id = ? AND date = ?",
        )
        .bind(habit_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(check)
    }

    /// Full history for one habit, newest first
    pub async fn list_history(&self, habit_id: &str) -> Result<Vec<HabitCheck>> {
        let history = sqlx::query_as::<_, HabitCheck>(
            "SELECT * FROM habit_history WHERE habit_id = ? ORDER BY date DESC",
        )
        .bind(habit_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }
}
