//! Backup-related commands
//!
//! Commands for exporting and importing the active user's tasks and notes.

use crate::app::AppState;
use crate::database::CollectionKind;
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What an import replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub reminders: Option<usize>,
    pub notes: Option<usize>,
}

/// Export tasks and notes; returns the written file
pub async fn export_data(state: &AppState) -> Result<PathBuf> {
    let ws = state.workspace().await?;
    state
        .backup
        .export(ws.tasks.tasks(), ws.notes.notes(), state.clock.now())
        .await
}

/// Import an export file after confirmation. Collections present in the
/// file replace the current ones; absent ones are left alone.
pub async fn import_data(state: &AppState, path: &Path) -> Result<ImportSummary> {
    let imported = state.backup.import(path).await?;
    if imported.is_empty() {
        tracing::warn!("Nothing to import in {:?}", path);
        return Ok(ImportSummary {
            reminders: None,
            notes: None,
        });
    }

    state
        .confirm("Importing replaces your current tasks and notes. Continue?")
        .await?;

    let mut ws = state.workspace().await?;
    let mut summary = ImportSummary {
        reminders: None,
        notes: None,
    };

    if let Some(tasks) = imported.reminders {
        summary.reminders = Some(tasks.len());
        ws.tasks.replace_all(tasks);
        state.persist(&ws, CollectionKind::Reminders)?;
    }
    if let Some(notes) = imported.notes {
        summary.notes = Some(notes.len());
        ws.notes.replace_all(notes);
        state.persist(&ws, CollectionKind::Notes)?;
    }

    tracing::info!("Import finished: {:?}", summary);
    Ok(summary)
}

/// Export files on disk, newest first
pub async fn list_exports(state: &AppState) -> Result<Vec<PathBuf>> {
    state.backup.list_exports().await
}
