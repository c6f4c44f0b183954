//! Error types for Lumina
//!
//! All errors use thiserror for structured error handling.
//! These errors serialize to their display string so callers can surface them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Routine not found: {0}")]
    RoutineNotFound(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with email {0} already exists")]
    EmailTaken(String),

    #[error("No active session, log in first")]
    NoActiveSession,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// True for the lookup failures the UI treats as a no-op.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::TaskNotFound(_)
                | AppError::UserNotFound(_)
                | AppError::NoteNotFound(_)
                | AppError::RoutineNotFound(_)
        )
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
