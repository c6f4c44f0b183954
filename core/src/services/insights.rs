//! Read-only views over tasks and notes: dashboard, calendar, admin
//! statistics and global search.
//!
//! Calendar bucketing happens in the caller's time zone; a task belongs to
//! the local calendar day its due instant falls on.

use crate::config::{
    ACTIVITY_DAYS, AGENDA_DAYS, AGENDA_MIN_DAYS, SEARCH_RESULT_LIMIT, STORAGE_QUOTA_BYTES,
    UPCOMING_TASK_LIMIT,
};
use crate::database::{Note, Task};
use crate::error::{AppError, Result};
use crate::services::notes::NoteBoard;
use crate::services::tasks::TaskEngine;
use chrono::{Datelike, Days, NaiveDate, TimeZone};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub pending: usize,
    pub completed: usize,
    /// Earliest-due incomplete tasks, overdue ones included
    pub upcoming: Vec<Task>,
}

impl DashboardSummary {
    /// Share of tasks done, 0.0 for an empty list
    pub fn completion_ratio(&self) -> f64 {
        let total = self.pending + self.completed;
        if total == 0 {
            0.0
        } else {
            self.completed as f64 / total as f64
        }
    }
}

pub fn dashboard(tasks: &[Task]) -> DashboardSummary {
    let completed = tasks.iter().filter(|t| t.is_completed).count();

    let mut upcoming: Vec<&Task> = tasks.iter().filter(|t| !t.is_completed).collect();
    upcoming.sort_by_key(|t| t.due_date_time);

    DashboardSummary {
        pending: tasks.len() - completed,
        completed,
        upcoming: upcoming
            .into_iter()
            .take(UPCOMING_TASK_LIMIT)
            .cloned()
            .collect(),
    }
}

/// Calendar cells for a month, Sunday first. Leading `None`s pad the first
/// week; there is no trailing padding.
pub fn month_grid(year: i32, month: u32) -> Result<Vec<Option<NaiveDate>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))?;

    let leading = first.weekday().num_days_from_sunday() as usize;
    let mut cells = vec![None; leading];
    cells.extend(
        first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(Some),
    );
    Ok(cells)
}

fn local_day<Tz: TimeZone>(task: &Task, tz: &Tz) -> NaiveDate {
    task.due_date_time.with_timezone(tz).date_naive()
}

/// Tasks due on `day` in `tz`, earliest first
pub fn tasks_on_day<'a, Tz: TimeZone>(tasks: &'a [Task], day: NaiveDate, tz: &Tz) -> Vec<&'a Task> {
    let mut hits: Vec<&Task> = tasks.iter().filter(|t| local_day(t, tz) == day).collect();
    hits.sort_by_key(|t| t.due_date_time);
    hits
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
}

/// The next two weeks from `today`. Days without tasks are dropped, except
/// the first few which always appear.
pub fn agenda<Tz: TimeZone>(tasks: &[Task], today: NaiveDate, tz: &Tz) -> Vec<AgendaDay> {
    (0..AGENDA_DAYS)
        .filter_map(|offset| {
            let date = today.checked_add_days(Days::new(offset as u64))?;
            let day_tasks = tasks_on_day(tasks, date, tz);
            (offset < AGENDA_MIN_DAYS || !day_tasks.is_empty()).then_some(AgendaDay {
                date,
                tasks: day_tasks.into_iter().cloned().collect(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPoint {
    pub date: NaiveDate,
    /// Tasks created that day
    pub created: usize,
    /// Completed tasks that were due that day
    pub completed: usize,
}

/// Last week of activity, oldest day first, ending on `today`
pub fn activity<Tz: TimeZone>(tasks: &[Task], today: NaiveDate, tz: &Tz) -> Vec<ActivityPoint> {
    (0..ACTIVITY_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back as u64)))
        .map(|date| ActivityPoint {
            date,
            created: tasks
                .iter()
                .filter(|t| t.created_at.with_timezone(tz).date_naive() == date)
                .count(),
            completed: tasks
                .iter()
                .filter(|t| t.is_completed && local_day(t, tz) == date)
                .count(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub user_count: usize,
    pub record_count: usize,
    pub storage_bytes: u64,
    pub storage_kib: f64,
    pub usage_percent: f64,
    pub activity: Vec<ActivityPoint>,
}

pub fn admin_stats<Tz: TimeZone>(
    user_count: usize,
    tasks: &[Task],
    notes: &[Note],
    storage_bytes: u64,
    today: NaiveDate,
    tz: &Tz,
) -> AdminStats {
    AdminStats {
        user_count,
        record_count: tasks.len() + notes.len(),
        storage_bytes,
        storage_kib: storage_bytes as f64 / 1024.0,
        usage_percent: storage_bytes as f64 / STORAGE_QUOTA_BYTES as f64 * 100.0,
        activity: activity(tasks, today, tz),
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub tasks: Vec<Task>,
    pub notes: Vec<Note>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.notes.is_empty()
    }
}

/// Case-insensitive search over task title/description and note content.
/// A blank query finds nothing.
pub fn global_search(engine: &TaskEngine, board: &NoteBoard, query: &str) -> SearchResults {
    let query = query.trim();
    if query.is_empty() {
        return SearchResults::default();
    }

    SearchResults {
        tasks: engine
            .search(query, SEARCH_RESULT_LIMIT)
            .into_iter()
            .cloned()
            .collect(),
        notes: board
            .search(query, SEARCH_RESULT_LIMIT)
            .into_iter()
            .cloned()
            .collect(),
    }
}
