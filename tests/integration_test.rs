//! Integration tests for Lifedesk
//!
//! These tests verify end-to-end functionality including:
//! - Database setup on disk
//! - Habit check-ins, streaks, and reordering
//! - Assistant command processing
//! - Reminder scheduling

use chrono::NaiveDate;
use lifedesk::app::AppState;
use lifedesk::database::models::{CreateHabitRequest, HabitType, TrackingType};
use lifedesk::functions::FunctionsClient;
use lifedesk::services::{CheckState, Notifier};
use std::sync::Arc;
use tempfile::TempDir;

struct GrantedNotifier;

impl Notifier for GrantedNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission_granted(&self) -> bool {
        true
    }

    fn notify(&self, _title: &str, _body: &str) {}
}

/// Helper to create an app state backed by a temp database
async fn create_test_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let functions = FunctionsClient::new("http://localhost", None);
    let state = AppState::initialize(&db_path, functions, Arc::new(GrantedNotifier))
        .await
        .unwrap();

    (state, temp_dir)
}

fn habit_request(user_id: &str, title: &str) -> CreateHabitRequest {
    CreateHabitRequest {
        user_id: user_id.to_string(),
        title: title.to_string(),
        habit_type: HabitType::Build,
        tracking_type: TrackingType::Task,
        checks_per_day: None,
        amount_target: None,
        time_target: None,
        emoji: None,
        color: None,
        repeat_days: None,
        notification_enabled: false,
        notification_time: None,
    }
}

#[tokio::test]
async fn test_habit_check_in_flow() {
    let (state, _temp) = create_test_state().await;

    let profile = state
        .repo
        .create_profile("me@example.com", Some("Me"))
        .await
        .unwrap();

    let habit = state
        .repo
        .create_habit(habit_request(&profile.id, "Drink water"))
        .await
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

    // One full cycle: completed, failed, back to neutral
    let state1 = state.habits.toggle_check(&habit.id, date).await.unwrap();
    assert_eq!(state1, CheckState::Completed);
    assert_eq!(state1.message(), "Habit completed!");

    assert_eq!(
        state.habits.toggle_check(&habit.id, date).await.unwrap(),
        CheckState::Failed
    );
    assert_eq!(
        state.habits.toggle_check(&habit.id, date).await.unwrap(),
        CheckState::Neutral
    );

    // Build a three-day streak ending at `date`
    for offset in 0..3 {
        let day = date - chrono::Duration::days(offset);
        state.habits.toggle_check(&habit.id, day).await.unwrap();
    }

    assert_eq!(state.habits.streak(&habit.id, date).await.unwrap(), 3);
    assert_eq!(
        state.habits.display_streak(&habit.id, date).await.unwrap(),
        Some(3)
    );
}

#[tokio::test]
async fn test_reorder_persists_across_reads() {
    let (state, _temp) = create_test_state().await;

    let profile = state
        .repo
        .create_profile("me@example.com", None)
        .await
        .unwrap();

    let mut ids = Vec::new();
    for title in ["a", "b", "c", "d"] {
        let habit = state
            .repo
            .create_habit(habit_request(&profile.id, title))
            .await
            .unwrap();
        ids.push(habit.id);
    }

    state.habits.reorder(&profile.id, &ids[3], &ids[0]).await.unwrap();

    let habits = state.repo.list_habits(&profile.id).await.unwrap();
    let titles: Vec<&str> = habits.iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, vec!["d", "a", "b", "c"]);

    let orders: Vec<i64> = habits.iter().map(|h| h.order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_assistant_commands_end_to_end() {
    let (state, _temp) = create_test_state().await;

    let profile = state
        .repo
        .create_profile("me@example.com", None)
        .await
        .unwrap();
    state.auth.sign_in(&state.repo, &profile.email).await.unwrap();

    let reply = r#"Done! [[ADD_TASK: {"title": "Buy milk"}]]
        [[ADD_HABIT: {"title": "Meditate"}]]
        [[ADD_BOOK: {"title": "Dune", "author": "Herbert"}]]"#;

    let applied = state.assistant.process_response(reply).await.unwrap();
    assert_eq!(applied, 3);

    let tasks = state.repo.list_tasks(&profile.id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk");

    let habits = state.repo.list_habits(&profile.id).await.unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0].checks_per_day, 1);

    // A second turn adding the same book reuses the catalog row
    state
        .assistant
        .process_response(r#"[[ADD_BOOK: {"title": "Dune"}]]"#)
        .await
        .unwrap();

    assert_eq!(state.repo.list_books().await.unwrap().len(), 1);
    assert_eq!(
        state.repo.list_reading_entries(&profile.id).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_notification_initialization_and_habit_delete() {
    let (state, _temp) = create_test_state().await;

    let profile = state
        .repo
        .create_profile("me@example.com", None)
        .await
        .unwrap();

    let mut with_reminder = habit_request(&profile.id, "Journal");
    with_reminder.notification_enabled = true;
    with_reminder.notification_time = Some("21:00".to_string());
    let habit = state.repo.create_habit(with_reminder).await.unwrap();

    state
        .repo
        .create_habit(habit_request(&profile.id, "No reminder"))
        .await
        .unwrap();

    state.habits.refresh_notifications(&profile.id).await.unwrap();
    assert_eq!(state.scheduler.armed_count(), 1);
    assert!(state.scheduler.is_armed(&habit.id));

    // Re-initialization does not stack duplicate timers
    state.habits.refresh_notifications(&profile.id).await.unwrap();
    assert_eq!(state.scheduler.armed_count(), 1);

    // Deleting the habit cancels its reminder and its history
    state.habits.delete_habit(&habit.id).await.unwrap();
    assert!(!state.scheduler.is_armed(&habit.id));
    assert!(state.repo.get_habit(&habit.id).await.is_err());

    state.shutdown();
    assert_eq!(state.scheduler.armed_count(), 0);
}

#[tokio::test]
async fn test_database_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let functions = FunctionsClient::new("http://localhost", None);
    let state = AppState::initialize(&db_path, functions.clone(), Arc::new(GrantedNotifier))
        .await
        .unwrap();

    let profile = state
        .repo
        .create_profile("me@example.com", None)
        .await
        .unwrap();
    state
        .repo
        .create_habit(habit_request(&profile.id, "Persist me"))
        .await
        .unwrap();
    state.shutdown();
    drop(state);

    let reopened = AppState::initialize(&db_path, functions, Arc::new(GrantedNotifier))
        .await
        .unwrap();

    let habits = reopened.repo.list_habits(&profile.id).await.unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0].title, "Persist me");
}
