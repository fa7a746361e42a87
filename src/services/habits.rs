//! Habit check model
//!
//! Translates user check actions into daily state, computes streaks and
//! progress text, and persists drag-reorders. Owns the transient elapsed
//! time accumulators for time-tracked habits; those never touch the
//! database until the timer stops.

use crate::config::STREAK_DISPLAY_THRESHOLD;
use crate::database::{Habit, HabitCheck, Repository, TrackingType};
use crate::error::{AppError, Result};
use crate::services::NotificationScheduler;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Daily state of a task-tracked habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Neutral,
    Completed,
    Failed,
}

impl CheckState {
    /// One step of the check cycle: neutral → completed → failed → neutral
    pub fn advance(self) -> Self {
        match self {
            CheckState::Neutral => CheckState::Completed,
            CheckState::Completed => CheckState::Failed,
            CheckState::Failed => CheckState::Neutral,
        }
    }

    /// Confirmation text shown after a toggle
    pub fn message(self) -> &'static str {
        match self {
            CheckState::Neutral => "Check-in cleared",
            CheckState::Completed => "Habit completed!",
            CheckState::Failed => "Habit not completed",
        }
    }

    fn from_entry(entry: Option<&HabitCheck>) -> Self {
        match entry {
            Some(e) if e.completed => CheckState::Completed,
            Some(e) if e.failed => CheckState::Failed,
            _ => CheckState::Neutral,
        }
    }
}

/// Result of stopping or starting a time-tracked habit's timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum TimerOutcome {
    Started,
    Stopped { minutes: f64, completed: bool },
}

/// Service for habit check-ins, streaks, and ordering
#[derive(Clone)]
pub struct HabitsService {
    repo: Repository,
    scheduler: Arc<NotificationScheduler>,
    /// Running elapsed-time accumulators, keyed by habit id
    running: Arc<Mutex<HashMap<String, Instant>>>,
}

impl HabitsService {
    pub fn new(repo: Repository, scheduler: Arc<NotificationScheduler>) -> Self {
        Self {
            repo,
            scheduler,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Advance a task-tracked habit's state for one date by one step of
    /// the check cycle and persist the result
    pub async fn toggle_check(&self, habit_id: &str, date: NaiveDate) -> Result<CheckState> {
        let habit = self.repo.get_habit(habit_id).await?;
        if habit.tracking_type != TrackingType::Task {
            return Err(AppError::Validation(
                "Only task-tracked habits use check toggles".to_string(),
            ));
        }

        let existing = self.repo.get_check(habit_id, date).await?;
        let next = CheckState::from_entry(existing.as_ref()).advance();

        let check = HabitCheck {
            habit_id: habit.id.clone(),
            user_id: habit.user_id.clone(),
            date,
            completed: next == CheckState::Completed,
            failed: next == CheckState::Failed,
            amount: None,
            time: None,
        };
        self.repo.upsert_check(&check).await?;

        tracing::debug!("Habit {} on {} is now {:?}", habit_id, date, next);
        Ok(next)
    }

    /// Increase an amount-tracked habit's progress for one date by 1
    pub async fn increment_amount(&self, habit_id: &str, date: NaiveDate) -> Result<HabitCheck> {
        self.adjust_amount(habit_id, date, 1.0).await
    }

    /// Decrease an amount-tracked habit's progress for one date by 1,
    /// clamped at zero
    pub async fn decrement_amount(&self, habit_id: &str, date: NaiveDate) -> Result<HabitCheck> {
        self.adjust_amount(habit_id, date, -1.0).await
    }

    async fn adjust_amount(
        &self,
        habit_id: &str,
        date: NaiveDate,
        delta: f64,
    ) -> Result<HabitCheck> {
        let habit = self.repo.get_habit(habit_id).await?;
        let target = match habit.tracking_type {
            TrackingType::Amount => habit.amount_target.unwrap_or(0.0),
            _ => {
                return Err(AppError::Validation(
                    "Habit is not amount-tracked".to_string(),
                ))
            }
        };

        let existing = self.repo.get_check(habit_id, date).await?;
        let current = existing.as_ref().and_then(|e| e.amount).unwrap_or(0.0);
        let amount = (current + delta).max(0.0);

        let check = HabitCheck {
            habit_id: habit.id.clone(),
            user_id: habit.user_id.clone(),
            date,
            // completed is derived from amount vs target, never set directly
            completed: amount >= target,
            failed: false,
            amount: Some(amount),
            time: None,
        };
        self.repo.upsert_check(&check).await
    }

    /// Start or stop a time-tracked habit's timer.
    ///
    /// Starting records a monotonic instant in memory; stopping converts
    /// the elapsed span to whole minutes, adds it to the date's stored
    /// time, and recomputes completion against the target.
    pub async fn toggle_timer(&self, habit_id: &str, date: NaiveDate) -> Result<TimerOutcome> {
        let habit = self.repo.get_habit(habit_id).await?;
        if habit.tracking_type != TrackingType::Time {
            return Err(AppError::Validation(
                "Habit is not time-tracked".to_string(),
            ));
        }

        let started = {
            let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
            running.remove(habit_id)
        };

        match started {
            None => {
                let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
                running.insert(habit_id.to_string(), Instant::now());
                tracing::debug!("Timer started for habit {}", habit_id);
                Ok(TimerOutcome::Started)
            }
            Some(start) => {
                let minutes = (start.elapsed().as_secs() / 60) as f64;
                let check = self.add_elapsed(&habit, date, minutes).await?;
                tracing::debug!("Timer stopped for habit {}: +{} min", habit_id, minutes);
                Ok(TimerOutcome::Stopped {
                    minutes,
                    completed: check.completed,
                })
            }
        }
    }

    async fn add_elapsed(
        &self,
        habit: &Habit,
        date: NaiveDate,
        minutes: f64,
    ) -> Result<HabitCheck> {
        let target = habit.time_target.unwrap_or(0.0);

        let existing = self.repo.get_check(&habit.id, date).await?;
        let time = existing.as_ref().and_then(|e| e.time).unwrap_or(0.0) + minutes;

        let check = HabitCheck {
            habit_id: habit.id.clone(),
            user_id: habit.user_id.clone(),
            date,
            completed: time >= target,
            failed: false,
            amount: None,
            time: Some(time),
        };
        self.repo.upsert_check(&check).await
    }

    /// Whether a timer is currently running for this habit
    pub fn timer_running(&self, habit_id: &str) -> bool {
        let running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        running.contains_key(habit_id)
    }

    /// Minutes accrued by a running (unstopped) timer, zero if none
    fn running_minutes(&self, habit_id: &str) -> f64 {
        let running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        running
            .get(habit_id)
            .map(|start| (start.elapsed().as_secs() / 60) as f64)
            .unwrap_or(0.0)
    }

    /// Consecutive completed days walking back from `today`; any gap or
    /// non-completed entry ends the count
    pub async fn streak(&self, habit_id: &str, today: NaiveDate) -> Result<u32> {
        let history = self.repo.list_history(habit_id).await?;
        let completed_by_date: HashMap<NaiveDate, bool> = history
            .iter()
            .map(|check| (check.date, check.completed))
            .collect();

        let mut streak = 0;
        let mut day = today;
        while completed_by_date.get(&day).copied().unwrap_or(false) {
            streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }

        Ok(streak)
    }

    /// Streak for display: tracked always, surfaced only at the threshold
    pub async fn display_streak(&self, habit_id: &str, today: NaiveDate) -> Result<Option<u32>> {
        let streak = self.streak(habit_id, today).await?;
        Ok((streak >= STREAK_DISPLAY_THRESHOLD).then_some(streak))
    }

    /// Short progress line for one habit on one date
    pub async fn progress_text(&self, habit_id: &str, date: NaiveDate) -> Result<String> {
        let habit = self.repo.get_habit(habit_id).await?;
        let entry = self.repo.get_check(habit_id, date).await?;

        let text = match habit.tracking_type {
            TrackingType::Task => {
                if entry.as_ref().map(|e| e.completed).unwrap_or(false) {
                    "done".to_string()
                } else {
                    "not done".to_string()
                }
            }
            TrackingType::Amount => {
                let current = entry.as_ref().and_then(|e| e.amount).unwrap_or(0.0);
                format!("{}/{}", current, habit.amount_target.unwrap_or(0.0))
            }
            TrackingType::Time => {
                let stored = entry.as_ref().and_then(|e| e.time).unwrap_or(0.0);
                let elapsed = stored + self.running_minutes(habit_id);
                format!("{}/{} min", elapsed, habit.time_target.unwrap_or(0.0))
            }
        };

        Ok(text)
    }

    /// Move the dragged habit to the drop target's position and persist
    /// the whole new order in one batch. No-op when the ids match.
    ///
    /// The batch is transactional: on failure the stored order is
    /// untouched and the caller re-reads it, so no optimistic state can
    /// outlive a failed write.
    pub async fn reorder(
        &self,
        user_id: &str,
        dragged_id: &str,
        target_id: &str,
    ) -> Result<Vec<Habit>> {
        let mut habits = self.repo.list_habits(user_id).await?;

        if dragged_id == target_id {
            return Ok(habits);
        }

        let source_index = habits
            .iter()
            .position(|h| h.id == dragged_id)
            .ok_or_else(|| AppError::HabitNotFound(dragged_id.to_string()))?;
        let target_index = habits
            .iter()
            .position(|h| h.id == target_id)
            .ok_or_else(|| AppError::HabitNotFound(target_id.to_string()))?;

        let dragged = habits.remove(source_index);
        habits.insert(target_index, dragged);

        for (index, habit) in habits.iter_mut().enumerate() {
            habit.order = index as i64;
        }

        let orders: Vec<(String, i64)> = habits
            .iter()
            .map(|h| (h.id.clone(), h.order))
            .collect();
        self.repo.update_habit_orders(&orders).await?;

        tracing::debug!("Reordered {} habits for user {}", habits.len(), user_id);
        Ok(habits)
    }

    /// Delete a habit and cancel its reminder timer. History cascades.
    pub async fn delete_habit(&self, habit_id: &str) -> Result<()> {
        self.repo.delete_habit(habit_id).await?;
        self.scheduler.cancel(habit_id);

        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        running.remove(habit_id);

        Ok(())
    }

    /// Re-arm reminders for every habit of this user that wants one.
    /// Call once permission is confirmed and whenever the habit set
    /// changes.
    pub async fn refresh_notifications(&self, user_id: &str) -> Result<()> {
        let habits = self.repo.list_habits(user_id).await?;
        self.scheduler.initialize_all(&habits);
        Ok(())
    }
}
