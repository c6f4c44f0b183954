//! Task-related commands
//!
//! Creation (explicit or smart input), edits, completion, status changes,
//! deletion and list views.

use super::{dispatch, ignore_not_found};
use crate::app::AppState;
use crate::database::{CollectionKind, Task, TaskStatus};
use crate::error::Result;
use crate::services::smart_input::parse_smart_task;
use crate::services::tasks::{NewTask, TaskFilter, TaskPatch, Transition};
use chrono::Local;

/// Create a task from explicit fields
pub async fn create_task(state: &AppState, draft: NewTask) -> Result<Task> {
    let mut ws = state.workspace().await?;
    let task = ws.tasks.create(draft);
    state.persist(&ws, CollectionKind::Reminders)?;

    tracing::info!("Task created: {} ({})", task.title, task.id);
    Ok(task)
}

/// Create a task from one line of free text, e.g. "Call mom tonight !high".
/// Time hints resolve in the local time zone.
pub async fn quick_add_task(state: &AppState, text: &str) -> Result<Task> {
    let draft = parse_smart_task(text, state.clock.now().with_timezone(&Local));
    tracing::debug!("Smart input parsed: {:?}", draft);
    create_task(state, NewTask::from(draft)).await
}

/// Display-sorted tasks matching `filter`
pub async fn list_tasks(state: &AppState, filter: TaskFilter) -> Result<Vec<Task>> {
    let ws = state.workspace().await?;
    Ok(ws.tasks.list(filter).into_iter().cloned().collect())
}

/// One kanban column
pub async fn tasks_by_status(state: &AppState, status: TaskStatus) -> Result<Vec<Task>> {
    let ws = state.workspace().await?;
    Ok(ws.tasks.by_status(status).into_iter().cloned().collect())
}

pub async fn edit_task(state: &AppState, id: &str, patch: TaskPatch) -> Result<Option<Task>> {
    let mut ws = state.workspace().await?;
    let edited = ignore_not_found(ws.tasks.edit(id, patch))?;
    if edited.is_some() {
        state.persist(&ws, CollectionKind::Reminders)?;
    }
    Ok(edited)
}

/// Flip completion. Completing a repeating task schedules its next occurrence.
pub async fn toggle_task(state: &AppState, id: &str) -> Result<Option<Transition>> {
    let mut ws = state.workspace().await?;
    let Some(transition) = ignore_not_found(ws.tasks.toggle_complete(id))? else {
        return Ok(None);
    };
    state.persist(&ws, CollectionKind::Reminders)?;
    dispatch(state, &mut ws, transition.effects.clone()).await?;
    Ok(Some(transition))
}

/// Move a task to a kanban column
pub async fn set_task_status(
    state: &AppState,
    id: &str,
    status: TaskStatus,
) -> Result<Option<Transition>> {
    let mut ws = state.workspace().await?;
    let Some(transition) = ignore_not_found(ws.tasks.change_status(id, status))? else {
        return Ok(None);
    };
    state.persist(&ws, CollectionKind::Reminders)?;
    dispatch(state, &mut ws, transition.effects.clone()).await?;
    Ok(Some(transition))
}

pub async fn toggle_subtask(
    state: &AppState,
    task_id: &str,
    subtask_id: &str,
) -> Result<Option<Task>> {
    let mut ws = state.workspace().await?;
    let task = ignore_not_found(ws.tasks.toggle_subtask(task_id, subtask_id))?;
    if task.is_some() {
        state.persist(&ws, CollectionKind::Reminders)?;
    }
    Ok(task)
}

/// Delete a task after confirmation. Returns false if it did not exist.
pub async fn delete_task(state: &AppState, id: &str) -> Result<bool> {
    let title = {
        let ws = state.workspace().await?;
        match ws.tasks.get(id) {
            Some(task) => task.title.clone(),
            None => {
                tracing::warn!("Task not found: {}, ignoring", id);
                return Ok(false);
            }
        }
    };

    state.confirm(&format!("Delete task \"{}\"?", title)).await?;

    let mut ws = state.workspace().await?;
    let deleted = ws.tasks.delete(id);
    if deleted {
        state.persist(&ws, CollectionKind::Reminders)?;
        tracing::info!("Task deleted: {}", id);
    }
    Ok(deleted)
}

/// Delete every task after confirmation
pub async fn clear_tasks(state: &AppState) -> Result<usize> {
    state.confirm("Delete all tasks?").await?;

    let mut ws = state.workspace().await?;
    let count = ws.tasks.clear_all();
    state.persist(&ws, CollectionKind::Reminders)?;

    tracing::info!("Cleared {} tasks", count);
    Ok(count)
}
