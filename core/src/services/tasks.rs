//! Task lifecycle engine
//!
//! Owns one user's task list in memory and applies every mutation to it:
//! create, edit, toggle completion, change status and delete. The engine is
//! synchronous and side-effect free; anything the outside world should react
//! to (XP, notifications) comes back as `Effect` values.
//!
//! Invariants kept on every operation:
//! - `is_completed == (status == Done)`
//! - `id` and `created_at` never change after creation
//! - completing a repeating task through `toggle_complete` appends exactly one
//!   fresh occurrence; the completed one stays in the list
//!
//! `change_status` to Done awards XP but does not regenerate a repeating task.
//! XP is never taken back when a task is reopened.

use crate::clock::{Clock, IdGenerator};
use crate::config::{DEFAULT_TASK_TITLE, XP_PER_COMPLETION};
use crate::database::{Category, Priority, RepeatType, Subtask, Task, TaskStatus};
use crate::error::{AppError, Result};
use crate::services::effects::Effect;
use crate::services::recurrence::RecurrenceZone;
use crate::services::smart_input::SmartTaskDraft;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// Fields for a new task; anything left out gets a default
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date_time: Option<DateTime<Utc>>,
    pub repeat_type: Option<RepeatType>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub subtasks: Option<Vec<Subtask>>,
}

impl From<SmartTaskDraft> for NewTask {
    fn from(draft: SmartTaskDraft) -> Self {
        Self {
            title: Some(draft.title),
            due_date_time: Some(draft.due),
            priority: Some(draft.priority),
            category: Some(draft.category),
            ..Self::default()
        }
    }
}

/// Editable fields of an existing task
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date_time: Option<DateTime<Utc>>,
    pub repeat_type: Option<RepeatType>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub subtasks: Option<Vec<Subtask>>,
}

impl TaskPatch {
    /// Merge the present fields onto `task`
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(due) = self.due_date_time {
            task.due_date_time = due;
        }
        if let Some(repeat) = self.repeat_type {
            task.repeat_type = repeat;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(subtasks) = self.subtasks {
            task.subtasks = subtasks;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date_time.is_none()
            && self.repeat_type.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.subtasks.is_none()
    }
}

/// Outcome of a completion-affecting operation
#[derive(Debug, Clone)]
pub struct Transition {
    pub task: Task,
    /// Next occurrence appended to the list, if one was generated
    pub spawned: Option<Task>,
    pub effects: Vec<Effect>,
}

/// Completion filter of the task list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    All,
    #[default]
    Active,
    Completed,
}

impl std::str::FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "active" => Ok(TaskFilter::Active),
            "completed" => Ok(TaskFilter::Completed),
            other => Err(format!("Unknown filter '{}'", other)),
        }
    }
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.is_completed,
            TaskFilter::Completed => task.is_completed,
        }
    }
}

/// Display ordering: open before done, then High > Medium > Low, then earliest due
pub fn display_cmp(a: &Task, b: &Task) -> Ordering {
    a.is_completed
        .cmp(&b.is_completed)
        .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
        .then_with(|| a.due_date_time.cmp(&b.due_date_time))
}

/// Tasks sorted for display. Stable, so ties keep insertion order.
pub fn sort_for_display(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| display_cmp(a, b));
    sorted
}

/// Task lifecycle engine for one user's collection
pub struct TaskEngine {
    tasks: Vec<Task>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    zone: RecurrenceZone,
}

/// Make `is_completed` agree with `status` on tasks from outside the engine.
/// Status wins.
fn normalize(tasks: &mut [Task]) {
    for task in tasks.iter_mut() {
        let done = task.status == TaskStatus::Done;
        if task.is_completed != done {
            tracing::warn!(
                "Task {} had isCompleted={} with status {:?}, fixing",
                task.id,
                task.is_completed,
                task.status
            );
            task.is_completed = done;
        }
    }
}

impl TaskEngine {
    pub fn new(mut tasks: Vec<Task>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        normalize(&mut tasks);
        Self {
            tasks,
            clock,
            ids,
            zone: RecurrenceZone::default(),
        }
    }

    /// Step repeating tasks on the calendar of `zone` (local by default)
    pub fn with_zone(mut self, zone: RecurrenceZone) -> Self {
        self.zone = zone;
        self
    }

    /// Tasks in stored (insertion) order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
    }

    /// Create a task from a draft and append it
    pub fn create(&mut self, draft: NewTask) -> Task {
        let now = self.clock.now();
        let title = draft
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string());

        let task = Task {
            id: self.ids.next_id(),
            title,
            description: draft.description.unwrap_or_default(),
            due_date_time: draft.due_date_time.unwrap_or(now),
            repeat_type: draft.repeat_type.unwrap_or_default(),
            priority: draft.priority.unwrap_or_default(),
            category: draft.category.unwrap_or_default(),
            is_completed: false,
            status: TaskStatus::Todo,
            created_at: now,
            subtasks: draft.subtasks.unwrap_or_default(),
        };

        tracing::debug!("Created task {} ({})", task.id, task.title);
        self.tasks.push(task.clone());
        task
    }

    /// Merge a patch onto an existing task
    pub fn edit(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        let idx = self.position(id)?;
        let task = &mut self.tasks[idx];
        patch.apply(task);

        tracing::debug!("Edited task {}", id);
        Ok(task.clone())
    }

    /// Flip completion. Completing awards XP and, for repeating tasks,
    /// appends the next occurrence due one unit after the original due date.
    pub fn toggle_complete(&mut self, id: &str) -> Result<Transition> {
        let idx = self.position(id)?;
        let mut effects = Vec::new();
        let mut spawned = None;

        if self.tasks[idx].is_completed {
            let task = &mut self.tasks[idx];
            task.is_completed = false;
            task.status = TaskStatus::Todo;
            tracing::debug!("Reopened task {}", id);
        } else {
            let task = &mut self.tasks[idx];
            task.is_completed = true;
            task.status = TaskStatus::Done;
            effects.push(Effect::AwardXp {
                amount: XP_PER_COMPLETION,
            });
            tracing::debug!("Completed task {}", id);

            if task.repeat_type != RepeatType::None {
                let next = self.next_occurrence(&self.tasks[idx]);
                effects.push(Effect::OccurrenceScheduled {
                    task_id: next.id.clone(),
                    due: next.due_date_time,
                });
                tracing::debug!("Scheduled occurrence {} of task {}", next.id, id);
                self.tasks.push(next.clone());
                spawned = Some(next);
            }
        }

        Ok(Transition {
            task: self.tasks[idx].clone(),
            spawned,
            effects,
        })
    }

    /// Set the kanban status directly. Moving into Done awards XP once;
    /// no occurrence is generated on this path.
    pub fn change_status(&mut self, id: &str, status: TaskStatus) -> Result<Transition> {
        let idx = self.position(id)?;
        let task = &mut self.tasks[idx];
        let was_completed = task.is_completed;

        task.status = status;
        task.is_completed = status == TaskStatus::Done;

        let mut effects = Vec::new();
        if task.is_completed && !was_completed {
            effects.push(Effect::AwardXp {
                amount: XP_PER_COMPLETION,
            });
        }

        tracing::debug!("Task {} moved to {:?}", id, status);
        Ok(Transition {
            task: task.clone(),
            spawned: None,
            effects,
        })
    }

    /// Flip one checklist item. Does not touch the parent's status.
    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<Task> {
        let idx = self.position(task_id)?;
        let task = &mut self.tasks[idx];
        let subtask = task
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| AppError::TaskNotFound(format!("{}/{}", task_id, subtask_id)))?;
        subtask.is_completed = !subtask.is_completed;

        Ok(task.clone())
    }

    /// Remove a task. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;

        if removed {
            tracing::debug!("Deleted task {}", id);
        }
        removed
    }

    /// Remove every task
    pub fn clear_all(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }

    /// Swap in a whole new list (import)
    pub fn replace_all(&mut self, mut tasks: Vec<Task>) {
        normalize(&mut tasks);
        self.tasks = tasks;
    }

    /// Sorted for display, then filtered by completion
    pub fn list(&self, filter: TaskFilter) -> Vec<&Task> {
        sort_for_display(&self.tasks)
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect()
    }

    /// Display-sorted tasks in the given kanban column
    pub fn by_status(&self, status: TaskStatus) -> Vec<&Task> {
        sort_for_display(&self.tasks)
            .into_iter()
            .filter(|t| t.status == status)
            .collect()
    }

    /// Case-insensitive match on title or description
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Task> {
        let needle = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }

    fn next_occurrence(&self, task: &Task) -> Task {
        Task {
            id: self.ids.next_id(),
            due_date_time: self.zone.advance(task.due_date_time, task.repeat_type),
            is_completed: false,
            status: TaskStatus::Todo,
            created_at: self.clock.now(),
            subtasks: task
                .subtasks
                .iter()
                .map(|s| Subtask {
                    is_completed: false,
                    ..s.clone()
                })
                .collect(),
            ..task.clone()
        }
    }
}
