//! Backup service
//!
//! Exports the active user's tasks and notes as a readable JSON file and
//! reads such files back. Import never touches routines or workout logs.

use crate::database::{Note, Task};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

const EXPORT_PREFIX: &str = "lumina-backup-";

/// On-disk export format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub reminders: Vec<Task>,
    pub notes: Vec<Note>,
    pub exported_at: DateTime<Utc>,
}

/// Collections found in an import file. A missing or non-array field is `None`
/// and leaves the current data alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedData {
    pub reminders: Option<Vec<Task>>,
    pub notes: Option<Vec<Note>>,
}

impl ImportedData {
    pub fn is_empty(&self) -> bool {
        self.reminders.is_none() && self.notes.is_none()
    }
}

/// `lumina-backup-YYYY-MM-DD.json`
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("{}{}.json", EXPORT_PREFIX, at.format("%Y-%m-%d"))
}

/// Parse an export. Fails on invalid JSON or on arrays whose entries do not
/// match the expected shape.
pub fn parse_import(content: &str) -> Result<ImportedData> {
    let json: Value = serde_json::from_str(content)
        .map_err(|e| AppError::Validation(format!("Failed to parse backup file: {}", e)))?;

    Ok(ImportedData {
        reminders: array_field(&json, "reminders")?,
        notes: array_field(&json, "notes")?,
    })
}

fn array_field<T: DeserializeOwned>(json: &Value, field: &str) -> Result<Option<Vec<T>>> {
    match json.get(field) {
        Some(value @ Value::Array(_)) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| AppError::Validation(format!("Invalid {} in backup file: {}", field, e))),
        _ => Ok(None),
    }
}

/// Backup service
#[derive(Clone)]
pub struct BackupService {
    backups_dir: PathBuf,
}

impl BackupService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            backups_dir: app_data_dir.join("backups"),
        }
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Write an export file; a second export on the same day replaces the first
    pub async fn export(&self, tasks: &[Task], notes: &[Note], now: DateTime<Utc>) -> Result<PathBuf> {
        fs::create_dir_all(&self.backups_dir).await?;

        let bundle = ExportBundle {
            reminders: tasks.to_vec(),
            notes: notes.to_vec(),
            exported_at: now,
        };
        let content = serde_json::to_string_pretty(&bundle)?;

        let path = self.backups_dir.join(export_file_name(now));
        fs::write(&path, content).await?;

        tracing::info!(
            "Exported {} tasks and {} notes to {:?}",
            tasks.len(),
            notes.len(),
            path
        );
        Ok(path)
    }

    pub async fn import(&self, path: &Path) -> Result<ImportedData> {
        tracing::info!("Importing from {:?}", path);
        let content = fs::read_to_string(path).await?;
        parse_import(&content)
    }

    /// Export files in the backups directory, newest first
    pub async fn list_exports(&self) -> Result<Vec<PathBuf>> {
        if !fs::try_exists(&self.backups_dir).await? {
            return Ok(Vec::new());
        }

        let mut exports = Vec::new();
        let mut entries = fs::read_dir(&self.backups_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(EXPORT_PREFIX) && name.ends_with(".json") {
                exports.push(entry.path());
            }
        }

        // Date-stamped names sort chronologically
        exports.sort();
        exports.reverse();
        Ok(exports)
    }
}
