//! Assistant command pipeline
//!
//! Assistant replies may embed structured commands in the form
//! `[[ ACTION_ENTITY: { ...json... } ]]`. Extraction is a pure parsing
//! step returning typed commands; dispatch applies each one as a CRUD
//! call scoped to the signed-in user. Commands apply in textual order,
//! each awaited before the next. Individual command failures are logged
//! and do not stop the batch; a malformed JSON payload aborts the whole
//! batch before anything is applied.

use crate::app::ChangeFeed;
use crate::auth::AuthSession;
use crate::database::models::{
    CreateGoalRequest, CreateHabitRequest, CreateTaskRequest, HabitType, TrackingType,
    UpdateGoalRequest, UpdateTaskRequest,
};
use crate::database::Repository;
use crate::error::Result;
use crate::functions::{ChatMessage, FunctionsClient};
use crate::services::ReadingService;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// CRUD verb of an embedded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Update,
    Delete,
}

impl Action {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ADD" => Some(Action::Add),
            "UPDATE" => Some(Action::Update),
            "DELETE" => Some(Action::Delete),
            _ => None,
        }
    }
}

/// Entity type of an embedded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Task,
    Goal,
    Habit,
    Note,
    Book,
}

impl Entity {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "TASK" => Some(Entity::Task),
            "GOAL" => Some(Entity::Goal),
            "HABIT" => Some(Entity::Habit),
            "NOTE" => Some(Entity::Note),
            "BOOK" => Some(Entity::Book),
            _ => None,
        }
    }
}

/// One structured command extracted from assistant text
#[derive(Debug, Clone)]
pub struct AssistantCommand {
    pub action: Action,
    pub entity: Entity,
    pub payload: Value,
}

fn command_regex() -> &'static Regex {
    static COMMAND_RE: OnceLock<Regex> = OnceLock::new();
    COMMAND_RE.get_or_init(|| {
        Regex::new(r"(?s)\[\[\s*([A-Z]+)_([A-Z]+)\s*:\s*(\{.*?\})\s*\]\]")
            .expect("command pattern is valid")
    })
}

/// Extract every embedded command, in order of appearance.
///
/// Unrecognized ACTION or ENTITY names are logged and skipped; malformed
/// JSON in any matched command fails the whole parse.
pub fn parse_commands(text: &str) -> Result<Vec<AssistantCommand>> {
    let mut commands = Vec::new();

    for captures in command_regex().captures_iter(text) {
        let action_str = &captures[1];
        let entity_str = &captures[2];

        // Malformed payloads abort the batch even for unknown pairs
        let payload: Value = serde_json::from_str(&captures[3])?;

        let (Some(action), Some(entity)) = (Action::parse(action_str), Entity::parse(entity_str))
        else {
            tracing::warn!("Skipping unrecognized command: {}_{}", action_str, entity_str);
            continue;
        };

        commands.push(AssistantCommand {
            action,
            entity,
            payload,
        });
    }

    Ok(commands)
}

fn payload_str<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

fn payload_bool(payload: &Value, key: &str) -> Option<bool> {
    payload.get(key).and_then(Value::as_bool)
}

/// Applies assistant commands and runs the chat round trip
#[derive(Clone)]
pub struct AssistantService {
    repo: Repository,
    auth: AuthSession,
    functions: FunctionsClient,
    reading: ReadingService,
    changes: ChangeFeed,
}

impl AssistantService {
    pub fn new(
        repo: Repository,
        auth: AuthSession,
        functions: FunctionsClient,
        reading: ReadingService,
        changes: ChangeFeed,
    ) -> Self {
        Self {
            repo,
            auth,
            functions,
            reading,
            changes,
        }
    }

    /// Send one chat message, apply any commands embedded in the reply,
    /// and return the reply text for display
    pub async fn send_message(&self, message: &str, history: &[ChatMessage]) -> Result<String> {
        let user_id = self.auth.current_user().await?;

        let response = self
            .functions
            .assistant_chat(message, &user_id, history)
            .await?;

        self.apply_commands(&user_id, &response.content).await?;

        Ok(response.content)
    }

    /// Extract and apply every command in one assistant reply.
    ///
    /// Requires a signed-in user before any command is touched. Returns
    /// the number of commands applied.
    pub async fn process_response(&self, text: &str) -> Result<usize> {
        let user_id = self.auth.current_user().await?;
        self.apply_commands(&user_id, text).await
    }

    async fn apply_commands(&self, user_id: &str, text: &str) -> Result<usize> {
        let commands = parse_commands(text)?;
        if commands.is_empty() {
            return Ok(0);
        }

        let mut applied = 0;
        for command in &commands {
            match self.apply_command(user_id, command).await {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => {
                    // Fire-and-forget: one failure never blocks the rest
                    tracing::error!(
                        "Assistant command {:?}_{:?} failed: {}",
                        command.action,
                        command.entity,
                        e
                    );
                }
            }
        }

        // Cached query state is stale regardless of individual outcomes
        self.changes.invalidate();

        tracing::info!("Applied {}/{} assistant commands", applied, commands.len());
        Ok(applied)
    }

    /// Route one command to its CRUD call. Returns false when the
    /// command was skipped (missing required field, unsupported pair).
    async fn apply_command(&self, user_id: &str, command: &AssistantCommand) -> Result<bool> {
        let payload = &command.payload;

        match (command.action, command.entity) {
            (Action::Add, Entity::Task) => {
                let Some(title) = payload_str(payload, "title") else {
                    tracing::warn!("ADD_TASK without title; skipping");
                    return Ok(false);
                };
                self.repo
                    .create_task(CreateTaskRequest {
                        user_id: user_id.to_string(),
                        title: title.to_string(),
                        description: payload_str(payload, "description").map(String::from),
                        due_date: None,
                    })
                    .await?;
            }
            (Action::Add, Entity::Goal) => {
                let Some(title) = payload_str(payload, "title") else {
                    tracing::warn!("ADD_GOAL without title; skipping");
                    return Ok(false);
                };
                self.repo
                    .create_goal(CreateGoalRequest {
                        user_id: user_id.to_string(),
                        title: title.to_string(),
                        description: payload_str(payload, "description").map(String::from),
                        period: payload_str(payload, "period").map(String::from),
                        target_date: None,
                    })
                    .await?;
            }
            (Action::Add, Entity::Habit) => {
                let Some(title) = payload_str(payload, "title") else {
                    tracing::warn!("ADD_HABIT without title; skipping");
                    return Ok(false);
                };
                self.repo
                    .create_habit(CreateHabitRequest {
                        user_id: user_id.to_string(),
                        title: title.to_string(),
                        habit_type: HabitType::Build,
                        tracking_type: TrackingType::Task,
                        checks_per_day: payload.get("checksPerDay").and_then(Value::as_i64),
                        amount_target: None,
                        time_target: None,
                        emoji: payload_str(payload, "emoji").map(String::from),
                        color: payload_str(payload, "color").map(String::from),
                        repeat_days: None,
                        notification_enabled: false,
                        notification_time: None,
                    })
                    .await?;
            }
            (Action::Add, Entity::Note) => {
                let Some(title) = payload_str(payload, "title") else {
                    tracing::warn!("ADD_NOTE without title; skipping");
                    return Ok(false);
                };
                let content = payload_str(payload, "content").unwrap_or_default();
                self.repo.create_note(user_id, title, content).await?;
            }
            (Action::Add, Entity::Book) => {
                let Some(title) = payload_str(payload, "title") else {
                    tracing::warn!("ADD_BOOK without title; skipping");
                    return Ok(false);
                };
                self.reading
                    .add_to_list(user_id, title, payload_str(payload, "author"))
                    .await?;
            }
            (Action::Update, Entity::Task) => {
                let Some(id) = payload_str(payload, "id") else {
                    tracing::warn!("UPDATE_TASK without id; skipping");
                    return Ok(false);
                };
                self.repo
                    .update_task(
                        user_id,
                        UpdateTaskRequest {
                            id: id.to_string(),
                            title: payload_str(payload, "title").map(String::from),
                            description: payload_str(payload, "description").map(String::from),
                            completed: payload_bool(payload, "completed"),
                            due_date: None,
                        },
                    )
                    .await?;
            }
            (Action::Update, Entity::Goal) => {
                let Some(id) = payload_str(payload, "id") else {
                    tracing::warn!("UPDATE_GOAL without id; skipping");
                    return Ok(false);
                };
                self.repo
                    .update_goal(
                        user_id,
                        UpdateGoalRequest {
                            id: id.to_string(),
                            title: payload_str(payload, "title").map(String::from),
                            description: payload_str(payload, "description").map(String::from),
                            period: payload_str(payload, "period").map(String::from),
                            completed: payload_bool(payload, "completed"),
                            target_date: None,
                        },
                    )
                    .await?;
            }
            (Action::Delete, Entity::Task) => {
                let Some(id) = payload_str(payload, "id") else {
                    tracing::warn!("DELETE_TASK without id; skipping");
                    return Ok(false);
                };
                self.repo.delete_task(user_id, id).await?;
            }
            (Action::Delete, Entity::Goal) => {
                let Some(id) = payload_str(payload, "id") else {
                    tracing::warn!("DELETE_GOAL without id; skipping");
                    return Ok(false);
                };
                self.repo.delete_goal(user_id, id).await?;
            }
            (action, entity) => {
                tracing::warn!("Unsupported command {:?}_{:?}; skipping", action, entity);
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::{create_test_repo, create_test_user};

    #[test]
    fn test_parse_single_command() {
        let text = r#"Sure! [[ADD_TASK: {"title": "Buy milk"}]] Let me know if you need more."#;
        let commands = parse_commands(text).unwrap();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].action, Action::Add);
        assert_eq!(commands[0].entity, Entity::Task);
        assert_eq!(commands[0].payload["title"], "Buy milk");
    }

    #[test]
    fn test_parse_preserves_textual_order() {
        let text = r#"
            [[ADD_TASK: {"title": "First"}]]
            some prose
            [[ DELETE_GOAL : {"id": "g1"} ]]
            [[UPDATE_TASK: {"id": "t1", "completed": true}]]
        "#;
        let commands = parse_commands(text).unwrap();

        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].payload["title"], "First");
        assert_eq!(commands[1].action, Action::Delete);
        assert_eq!(commands[2].action, Action::Update);
    }

    #[test]
    fn test_parse_nested_json_payload() {
        let text = r#"[[ADD_NOTE: {"title": "Plan", "content": "{nested} braces", "meta": {"depth": 2}}]]"#;
        let commands = parse_commands(text).unwrap();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].payload["meta"]["depth"], 2);
    }

    #[test]
    fn test_parse_no_matches() {
        let commands = parse_commands("Just a friendly reply with no commands.").unwrap();
        assert!(commands.is_empty());
    }

    #[test]
    fn test_parse_unknown_pair_skipped() {
        let text = r#"[[ADD_WIDGET: {"title": "x"}]] [[ADD_TASK: {"title": "Real"}]]"#;
        let commands = parse_commands(text).unwrap();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].payload["title"], "Real");
    }

    #[test]
    fn test_parse_malformed_json_fails_batch() {
        let text = r#"[[ADD_TASK: {"title": "ok"}]] [[ADD_TASK: {broken}]]"#;
        assert!(parse_commands(text).is_err());
    }

    async fn create_test_service() -> (AssistantService, Repository, String) {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo).await;

        let auth = AuthSession::new();
        auth.sign_in(&repo, &user.email).await.unwrap();

        let functions = FunctionsClient::new("http://localhost", None);
        let reading = ReadingService::new(repo.clone(), functions.clone());
        let changes = ChangeFeed::new();

        let service = AssistantService::new(repo.clone(), auth, functions, reading, changes);
        (service, repo, user.id)
    }

    #[tokio::test]
    async fn test_add_task_from_reply() {
        let (service, repo, user_id) = create_test_service().await;
        let revision = service.changes.revision();

        let applied = service
            .process_response(r#"Sure! [[ADD_TASK: {"title": "Buy milk"}]] Anything else?"#)
            .await
            .unwrap();

        assert_eq!(applied, 1);

        let tasks = repo.list_tasks(&user_id).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy milk");
        assert!(!tasks[0].completed);

        // Cached queries were invalidated
        assert!(service.changes.revision() > revision);
    }

    #[tokio::test]
    async fn test_reply_without_commands_has_no_side_effects() {
        let (service, repo, user_id) = create_test_service().await;
        let revision = service.changes.revision();

        let applied = service
            .process_response("Happy to help! Nothing to do here.")
            .await
            .unwrap();

        assert_eq!(applied, 0);
        assert!(repo.list_tasks(&user_id).await.unwrap().is_empty());
        assert_eq!(service.changes.revision(), revision);
    }

    #[tokio::test]
    async fn test_requires_signed_in_user() {
        let (service, repo, user_id) = create_test_service().await;
        service.auth.sign_out().await;

        let result = service
            .process_response(r#"[[ADD_TASK: {"title": "Buy milk"}]]"#)
            .await;

        assert!(result.is_err());
        assert!(repo.list_tasks(&user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_aborts_whole_batch() {
        let (service, repo, user_id) = create_test_service().await;

        let result = service
            .process_response(r#"[[ADD_TASK: {"title": "ok"}]] [[ADD_TASK: {broken}]]"#)
            .await;

        assert!(result.is_err());
        // The valid command before the malformed one was not applied
        assert!(repo.list_tasks(&user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_the_rest() {
        let (service, repo, user_id) = create_test_service().await;

        let applied = service
            .process_response(
                r#"[[UPDATE_TASK: {"id": "missing", "completed": true}]]
                   [[ADD_TASK: {"title": "Still lands"}]]"#,
            )
            .await
            .unwrap();

        assert_eq!(applied, 1);
        assert_eq!(repo.list_tasks(&user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_without_id_is_skipped() {
        let (service, repo, user_id) = create_test_service().await;

        repo.create_task(crate::database::models::CreateTaskRequest {
            user_id: user_id.clone(),
            title: "Untouched".to_string(),
            description: None,
            due_date: None,
        })
        .await
        .unwrap();

        let applied = service
            .process_response(r#"[[UPDATE_TASK: {"completed": true}]]"#)
            .await
            .unwrap();

        assert_eq!(applied, 0);
        let tasks = repo.list_tasks(&user_id).await.unwrap();
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let (service, repo, user_id) = create_test_service().await;

        let task = repo
            .create_task(crate::database::models::CreateTaskRequest {
                user_id: user_id.clone(),
                title: "Original".to_string(),
                description: Some("keep me".to_string()),
                due_date: None,
            })
            .await
            .unwrap();

        let reply = format!(r#"[[UPDATE_TASK: {{"id": "{}", "completed": true}}]]"#, task.id);
        service.process_response(&reply).await.unwrap();

        let updated = repo.get_task(&task.id).await.unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "Original");
        assert_eq!(updated.description.as_deref(), Some("keep me"));
    }

    #[tokio::test]
    async fn test_add_goal_defaults_period() {
        let (service, repo, user_id) = create_test_service().await;

        service
            .process_response(r#"[[ADD_GOAL: {"title": "Learn Rust"}]]"#)
            .await
            .unwrap();

        let goals = repo.list_goals(&user_id).await.unwrap();
        assert_eq!(goals[0].period, "short");
    }

    #[tokio::test]
    async fn test_add_habit_defaults() {
        let (service, repo, user_id) = create_test_service().await;

        service
            .process_response(r#"[[ADD_HABIT: {"title": "Meditate"}]]"#)
            .await
            .unwrap();

        let habits = repo.list_habits(&user_id).await.unwrap();
        assert_eq!(habits[0].checks_per_day, 1);
        assert_eq!(habits[0].tracking_type, TrackingType::Task);
    }

    #[tokio::test]
    async fn test_add_book_reuses_catalog_row() {
        let (service, repo, user_id) = create_test_service().await;

        // Two chat turns adding the same title
        service
            .process_response(r#"[[ADD_BOOK: {"title": "Dune", "author": "Herbert"}]]"#)
            .await
            .unwrap();
        service
            .process_response(r#"[[ADD_BOOK: {"title": "Dune", "author": "Herbert"}]]"#)
            .await
            .unwrap();

        let books = repo.list_books().await.unwrap();
        assert_eq!(books.len(), 1);

        let entries = repo.list_reading_entries(&user_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.book_id == books[0].id));
        assert!(entries.iter().all(|e| e.status == "to_read"));
    }

    #[tokio::test]
    async fn test_delete_task_command() {
        let (service, repo, user_id) = create_test_service().await;

        let task = repo
            .create_task(crate::database::models::CreateTaskRequest {
                user_id: user_id.clone(),
                title: "Doomed".to_string(),
                description: None,
                due_date: None,
            })
            .await
            .unwrap();

        let reply = format!(r#"[[DELETE_TASK: {{"id": "{}"}}]]"#, task.id);
        service.process_response(&reply).await.unwrap();

        assert!(repo.list_tasks(&user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commands_cannot_touch_another_users_rows() {
        let (service, repo, _user_id) = create_test_service().await;

        let other = repo
            .create_profile("other@example.com", Some("Other"))
            .await
            .unwrap();
        let task = repo
            .create_task(crate::database::models::CreateTaskRequest {
                user_id: other.id.clone(),
                title: "Not yours".to_string(),
                description: None,
                due_date: None,
            })
            .await
            .unwrap();

        let reply = format!(
            r#"[[UPDATE_TASK: {{"id": "{id}", "completed": true}}]]
               [[DELETE_TASK: {{"id": "{id}"}}]]"#,
            id = task.id
        );
        let applied = service.process_response(&reply).await.unwrap();

        // Both commands fail as not-found; the other user's task survives
        assert_eq!(applied, 0);
        let survivor = repo.get_task(&task.id).await.unwrap();
        assert!(!survivor.completed);
        assert_eq!(survivor.user_id, other.id);
    }

    #[tokio::test]
    async fn test_unsupported_pair_skipped_at_dispatch() {
        let (service, repo, user_id) = create_test_service().await;

        // DELETE_NOTE parses but has no dispatch arm
        let applied = service
            .process_response(r#"[[DELETE_NOTE: {"id": "n1"}]] [[ADD_TASK: {"title": "ok"}]]"#)
            .await
            .unwrap();

        assert_eq!(applied, 1);
        assert_eq!(repo.list_tasks(&user_id).await.unwrap().len(), 1);
    }
}
