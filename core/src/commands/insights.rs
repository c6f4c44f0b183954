//! Dashboard, calendar, search and admin commands
//!
//! Calendar views bucket tasks by local calendar day.

use crate::app::AppState;
use crate::database::Task;
use crate::error::Result;
use crate::services::insights::{self, AdminStats, AgendaDay, DashboardSummary, SearchResults};
use chrono::{Local, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CalendarCell {
    pub date: Option<NaiveDate>,
    pub tasks: Vec<Task>,
}

pub async fn dashboard(state: &AppState) -> Result<DashboardSummary> {
    let ws = state.workspace().await?;
    Ok(insights::dashboard(ws.tasks.tasks()))
}

/// Month view, Sunday-first, each day with its tasks
pub async fn month_calendar(state: &AppState, year: i32, month: u32) -> Result<Vec<CalendarCell>> {
    let grid = insights::month_grid(year, month)?;
    let ws = state.workspace().await?;

    Ok(grid
        .into_iter()
        .map(|date| CalendarCell {
            tasks: date
                .map(|day| {
                    insights::tasks_on_day(ws.tasks.tasks(), day, &Local)
                        .into_iter()
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            date,
        })
        .collect())
}

pub async fn agenda(state: &AppState) -> Result<Vec<AgendaDay>> {
    let today = state.clock.now().with_timezone(&Local).date_naive();
    let ws = state.workspace().await?;
    Ok(insights::agenda(ws.tasks.tasks(), today, &Local))
}

pub async fn global_search(state: &AppState, query: &str) -> Result<SearchResults> {
    let ws = state.workspace().await?;
    Ok(insights::global_search(&ws.tasks, &ws.notes, query))
}

pub async fn admin_stats(state: &AppState) -> Result<AdminStats> {
    let user_count = state.users.list_users().await?.len();
    let storage_bytes = state.repo.storage_bytes().await?;
    let today = state.clock.now().with_timezone(&Local).date_naive();

    let ws = state.workspace().await?;
    Ok(insights::admin_stats(
        user_count,
        ws.tasks.tasks(),
        ws.notes.notes(),
        storage_bytes,
        today,
        &Local,
    ))
}

/// Wipe every stored record after confirmation and reseed the demo account.
/// Ends the current session.
pub async fn factory_reset(state: &AppState) -> Result<()> {
    state
        .confirm("Erase ALL data for every account? This cannot be undone.")
        .await?;

    state.flush().await?;
    state.discard_workspace().await;
    state.repo.clear_all().await?;
    state.users.initialize().await?;

    tracing::warn!("Factory reset completed");
    Ok(())
}
