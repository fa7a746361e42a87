//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to the frontend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An authenticated user profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Habit semantics: something to build up or something to quit.
/// Display-only, does not alter check logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HabitType {
    Build,
    Quit,
}

/// How a habit's daily progress is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TrackingType {
    Task,
    Amount,
    Time,
}

/// A user-defined recurring activity tracked per calendar day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub habit_type: HabitType,
    pub tracking_type: TrackingType,
    pub checks_per_day: i64,
    pub amount_target: Option<f64>,
    pub time_target: Option<f64>,
    pub emoji: Option<String>,
    pub color: Option<String>,
    /// Comma-separated weekday numbers, empty/None means every day
    pub repeat_days: Option<String>,
    /// User-defined list position; unique per user, not required contiguous
    pub order: i64,
    pub notification_enabled: bool,
    /// "HH:MM" wall-clock time, required when notifications are enabled
    pub notification_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-date record of a habit's progress. At most one row per
/// (habit_id, date); writes replace, never duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HabitCheck {
    pub habit_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub completed: bool,
    pub failed: bool,
    pub amount: Option<f64>,
    /// Accumulated minutes for time-tracked habits
    pub time: Option<f64>,
}

/// Create habit request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateHabitRequest {
    pub user_id: String,
    pub title: String,
    pub habit_type: HabitType,
    pub tracking_type: TrackingType,
    pub checks_per_day: Option<i64>,
    pub amount_target: Option<f64>,
    pub time_target: Option<f64>,
    pub emoji: Option<String>,
    pub color: Option<String>,
    pub repeat_days: Option<String>,
    pub notification_enabled: bool,
    pub notification_time: Option<String>,
}

/// Update habit request. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateHabitRequest {
    pub id: String,
    pub title: Option<String>,
    pub checks_per_day: Option<i64>,
    pub amount_target: Option<f64>,
    pub time_target: Option<f64>,
    pub emoji: Option<String>,
    pub color: Option<String>,
    pub repeat_days: Option<String>,
    pub notification_enabled: Option<bool>,
    pub notification_time: Option<String>,
}

/// A to-do item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
}

/// A longer-horizon goal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    /// "short" | "medium" | "long"
    pub period: String,
    pub completed: bool,
    pub target_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGoalRequest {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub period: Option<String>,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGoalRequest {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub period: Option<String>,
    pub completed: Option<bool>,
    pub target_date: Option<NaiveDate>,
}

/// A free-text note
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog book. Shared across users and de-duplicated by title.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One user's tracking entry for a catalog book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReadingEntry {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub status: String,
    pub added_at: DateTime<Utc>,
}

/// A shopping-list item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShoppingItem {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub quantity: i64,
    pub purchased: bool,
    pub created_at: DateTime<Utc>,
}

/// A calendar event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
