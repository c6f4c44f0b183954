//! Integration tests for Lumina
//!
//! These tests drive the command layer end to end over a real SQLite store:
//! - Accounts, sessions and workspace persistence
//! - Task completion, recurrence and XP gating
//! - Confirmation of destructive commands
//! - Export, import and factory reset

use chrono::{Duration, TimeZone, Utc};
use lumina::app::{AppState, Collaborators};
use lumina::clock::{FixedClock, SequentialIds};
use lumina::commands;
use lumina::database::{NoteColor, PlanTier, Priority, RepeatType, TaskStatus};
use lumina::error::AppError;
use lumina::services::effects::{AlwaysConfirm, ConfirmGate, Effect, NeverConfirm, RecordingSink};
use lumina::services::tasks::{NewTask, TaskFilter};
use lumina::services::users::{DEMO_USER_EMAIL, DEMO_USER_PASSWORD};
use lumina::services::workouts::RecommendedWorkout;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    state: AppState,
    clock: Arc<FixedClock>,
    sink: Arc<RecordingSink>,
}

/// Open the data directory with a frozen clock and a recording sink
async fn open(dir: &Path, confirm: Arc<dyn ConfirmGate>) -> Harness {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap(),
    ));
    let sink = Arc::new(RecordingSink::new());
    let state = AppState::setup_with(
        dir,
        Collaborators {
            clock: clock.clone(),
            ids: Arc::new(SequentialIds::new("id")),
            sink: sink.clone(),
            confirm,
        },
    )
    .await
    .unwrap();

    Harness { state, clock, sink }
}

fn draft(title: &str, repeat: RepeatType) -> NewTask {
    NewTask {
        title: Some(title.to_string()),
        due_date_time: Some(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()),
        repeat_type: Some(repeat),
        ..NewTask::default()
    }
}

#[tokio::test]
async fn test_commands_require_a_session() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;

    assert!(commands::current_user(&h.state).await.unwrap().is_none());
    let err = commands::list_tasks(&h.state, TaskFilter::All).await.unwrap_err();
    assert!(matches!(err, AppError::NoActiveSession));

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_demo_login_and_smart_add() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;

    let user = commands::login(&h.state, DEMO_USER_EMAIL, DEMO_USER_PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.plan, PlanTier::Free);

    let task = commands::quick_add_task(&h.state, "Buy milk !high")
        .await
        .unwrap();
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.status, TaskStatus::Todo);

    let active = commands::list_tasks(&h.state, TaskFilter::Active).await.unwrap();
    assert_eq!(active.len(), 1);

    let bad = commands::login(&h.state, DEMO_USER_EMAIL, "wrong").await;
    assert!(matches!(bad, Err(AppError::InvalidCredentials)));

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_completing_repeating_task_spawns_next_occurrence() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();

    let task = commands::create_task(&h.state, draft("Stand-up", RepeatType::Daily))
        .await
        .unwrap();
    let transition = commands::toggle_task(&h.state, &task.id)
        .await
        .unwrap()
        .unwrap();

    assert!(transition.task.is_completed);
    let next = transition.spawned.unwrap();
    assert_eq!(next.due_date_time, task.due_date_time + Duration::days(1));
    assert!(!next.is_completed);
    assert_eq!(next.repeat_type, RepeatType::Daily);

    let all = commands::list_tasks(&h.state, TaskFilter::All).await.unwrap();
    assert_eq!(all.len(), 2);

    // Free plan: no XP, only the occurrence reaches the sink
    let effects = h.sink.take();
    assert_eq!(effects.len(), 1);
    assert!(matches!(effects[0], Effect::OccurrenceScheduled { .. }));

    // Unknown ids are ignored
    assert!(commands::toggle_task(&h.state, "missing").await.unwrap().is_none());

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_paid_plan_earns_xp_and_levels_up() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();
    commands::change_plan(&h.state, PlanTier::Pro).await.unwrap();

    for title in ["One", "Two"] {
        let task = commands::create_task(&h.state, draft(title, RepeatType::None))
            .await
            .unwrap();
        commands::toggle_task(&h.state, &task.id).await.unwrap();
    }

    let effects = h.sink.take();
    assert_eq!(
        effects,
        vec![
            Effect::AwardXp { amount: 50 },
            Effect::AwardXp { amount: 50 },
            Effect::LevelUp { level: 2 },
        ]
    );

    let user = commands::current_user(&h.state).await.unwrap().unwrap();
    assert_eq!(user.xp, 100);
    assert_eq!(user.level, 2);

    // Reopening keeps the XP
    let listed = commands::list_tasks(&h.state, TaskFilter::Completed).await.unwrap();
    commands::toggle_task(&h.state, &listed[0].id).await.unwrap();
    let user = commands::current_user(&h.state).await.unwrap().unwrap();
    assert_eq!(user.xp, 100);

    h.state.shutdown().await.unwrap();
}

/// Create and complete `count` one-off tasks
async fn complete_tasks(state: &AppState, count: usize) {
    for i in 0..count {
        let task = commands::create_task(state, draft(&format!("Task {}", i), RepeatType::None))
            .await
            .unwrap();
        commands::toggle_task(state, &task.id).await.unwrap();
    }
}

#[tokio::test]
async fn test_sound_setting_gates_cues() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();
    commands::change_plan(&h.state, PlanTier::Standard).await.unwrap();

    // 100 XP reaches level 2, with its cue
    complete_tasks(&h.state, 2).await;
    assert_eq!(h.sink.take_sounds(), vec![Effect::LevelUp { level: 2 }]);

    let mut notifications = commands::get_settings(&h.state).await.unwrap().notifications;
    notifications.sound_enabled = false;
    commands::update_notification_settings(&h.state, notifications)
        .await
        .unwrap();

    // 300 XP reaches level 3 silently
    complete_tasks(&h.state, 4).await;
    assert!(h.sink.take().contains(&Effect::LevelUp { level: 3 }));
    assert!(h.sink.take_sounds().is_empty());

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_imported_tasks_keep_completion_consistent() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();
    let task = commands::create_task(&h.state, draft("Imported", RepeatType::None))
        .await
        .unwrap();

    let mut value = serde_json::to_value(&task).unwrap();
    value["isCompleted"] = serde_json::Value::Bool(true);
    let file = temp.path().join("hand-edited.json");
    std::fs::write(&file, serde_json::json!({ "reminders": [value] }).to_string()).unwrap();

    commands::import_data(&h.state, &file).await.unwrap();

    let tasks = commands::list_tasks(&h.state, TaskFilter::All).await.unwrap();
    assert_eq!(tasks[0].status, TaskStatus::Todo);
    assert!(!tasks[0].is_completed);

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_workspace_survives_restart() {
    let temp = TempDir::new().unwrap();

    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();
    commands::create_task(&h.state, draft("Persist me", RepeatType::Weekly))
        .await
        .unwrap();
    commands::create_note(&h.state, "Remember the milk", NoteColor::Blue)
        .await
        .unwrap();
    commands::import_routine(&h.state, RecommendedWorkout::Hiit)
        .await
        .unwrap();
    h.state.shutdown().await.unwrap();

    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    let user = commands::current_user(&h.state).await.unwrap().unwrap();
    assert_eq!(user.email, "ada@example.com");

    let tasks = commands::list_tasks(&h.state, TaskFilter::All).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Persist me");
    assert_eq!(tasks[0].repeat_type, RepeatType::Weekly);

    let notes = commands::list_notes(&h.state).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].color, NoteColor::Blue);

    assert_eq!(commands::list_routines(&h.state).await.unwrap().len(), 1);

    // Logging out ends the resumed session for the next start too
    commands::logout(&h.state).await.unwrap();
    h.state.shutdown().await.unwrap();

    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    assert!(commands::current_user(&h.state).await.unwrap().is_none());
    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_users_keep_separate_workspaces() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;

    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();
    commands::create_task(&h.state, draft("Ada's task", RepeatType::None))
        .await
        .unwrap();

    commands::login(&h.state, DEMO_USER_EMAIL, DEMO_USER_PASSWORD)
        .await
        .unwrap();
    assert!(commands::list_tasks(&h.state, TaskFilter::All)
        .await
        .unwrap()
        .is_empty());

    commands::login(&h.state, "ADA@example.com", "secret").await.unwrap();
    let tasks = commands::list_tasks(&h.state, TaskFilter::All).await.unwrap();
    assert_eq!(tasks.len(), 1);

    let taken = commands::register(&h.state, "Other", "ada@EXAMPLE.com", "pw").await;
    assert!(matches!(taken, Err(AppError::EmailTaken(_))));

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_declined_confirmation_cancels_delete() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(NeverConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();
    let task = commands::create_task(&h.state, draft("Keep me", RepeatType::None))
        .await
        .unwrap();

    let err = commands::delete_task(&h.state, &task.id).await.unwrap_err();
    assert!(matches!(err, AppError::Cancelled));
    assert_eq!(commands::list_tasks(&h.state, TaskFilter::All).await.unwrap().len(), 1);

    // Missing tasks never prompt
    assert!(!commands::delete_task(&h.state, "missing").await.unwrap());

    // Turning confirmation off skips the gate
    let mut behavior = commands::get_settings(&h.state).await.unwrap().behavior;
    behavior.confirm_destructive = false;
    commands::update_behavior_settings(&h.state, behavior).await.unwrap();
    assert!(commands::delete_task(&h.state, &task.id).await.unwrap());

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_export_then_import_restores_collections() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();
    commands::create_task(&h.state, draft("Backed up", RepeatType::Monthly))
        .await
        .unwrap();
    commands::create_note(&h.state, "Sticky", NoteColor::Yellow)
        .await
        .unwrap();

    let path = commands::export_data(&h.state).await.unwrap();
    assert!(path.ends_with("lumina-backup-2024-03-14.json"));
    assert_eq!(commands::list_exports(&h.state).await.unwrap(), vec![path.clone()]);

    commands::clear_tasks(&h.state).await.unwrap();
    commands::clear_notes(&h.state).await.unwrap();
    assert!(commands::list_tasks(&h.state, TaskFilter::All)
        .await
        .unwrap()
        .is_empty());

    let summary = commands::import_data(&h.state, &path).await.unwrap();
    assert_eq!(summary.reminders, Some(1));
    assert_eq!(summary.notes, Some(1));

    let tasks = commands::list_tasks(&h.state, TaskFilter::All).await.unwrap();
    assert_eq!(tasks[0].title, "Backed up");
    assert_eq!(commands::list_notes(&h.state).await.unwrap()[0].content, "Sticky");

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_insights_over_workspace() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();

    let task = commands::create_task(&h.state, draft("Quarterly report", RepeatType::None))
        .await
        .unwrap();
    commands::create_task(&h.state, draft("Dentist", RepeatType::None))
        .await
        .unwrap();
    commands::create_note(&h.state, "report outline", NoteColor::Green)
        .await
        .unwrap();
    commands::toggle_task(&h.state, &task.id).await.unwrap();

    let summary = commands::dashboard(&h.state).await.unwrap();
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.completed, 1);

    let found = commands::global_search(&h.state, "report").await.unwrap();
    assert_eq!(found.tasks.len(), 1);
    assert_eq!(found.notes.len(), 1);
    assert!(commands::global_search(&h.state, "  ").await.unwrap().is_empty());

    h.state.flush().await.unwrap();
    let stats = commands::admin_stats(&h.state).await.unwrap();
    assert_eq!(stats.user_count, 2);
    assert_eq!(stats.record_count, 3);
    assert!(stats.storage_bytes > 0);

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_workout_session_is_logged() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();

    let routine = commands::import_routine(&h.state, RecommendedWorkout::UpperBody)
        .await
        .unwrap();
    commands::start_workout(&h.state, &routine.id).await.unwrap();
    commands::update_set(&h.state, 0, 0, Some(40.0), Some(10))
        .await
        .unwrap();
    assert!(commands::toggle_set(&h.state, 0, 0).await.unwrap());
    assert!(matches!(
        h.sink.take().as_slice(),
        [Effect::SetCompleted { set_index: 0, .. }]
    ));

    h.clock.advance(Duration::minutes(30));
    let log = commands::finish_workout(&h.state).await.unwrap();
    assert_eq!(log.duration_seconds, 30 * 60);
    assert_eq!(commands::last_workout_volume(&h.state).await.unwrap(), Some(400.0));
    assert!(commands::active_workout(&h.state).await.unwrap().is_none());

    h.state.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_factory_reset_wipes_accounts() {
    let temp = TempDir::new().unwrap();
    let h = open(temp.path(), Arc::new(AlwaysConfirm)).await;
    commands::register(&h.state, "Ada", "ada@example.com", "secret")
        .await
        .unwrap();
    commands::create_task(&h.state, draft("Gone soon", RepeatType::None))
        .await
        .unwrap();

    commands::factory_reset(&h.state).await.unwrap();

    assert!(commands::current_user(&h.state).await.unwrap().is_none());
    let users = commands::list_users(&h.state).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, DEMO_USER_EMAIL);

    let relogin = commands::login(&h.state, "ada@example.com", "secret").await;
    assert!(matches!(relogin, Err(AppError::InvalidCredentials)));

    h.state.shutdown().await.unwrap();
}
