//! Services module
//!
//! Business logic services that coordinate between commands and repository.

pub mod autosave;
pub mod backup;
pub mod effects;
pub mod gamification;
pub mod insights;
pub mod notes;
pub mod recurrence;
pub mod reminders;
pub mod settings;
pub mod smart_input;
pub mod tasks;
pub mod users;
pub mod workouts;

pub use autosave::AutoSaver;
pub use backup::BackupService;
pub use effects::{ConfirmGate, Effect, EffectSink};
pub use notes::NoteBoard;
pub use reminders::DueWatcher;
pub use settings::SettingsService;
pub use tasks::TaskEngine;
pub use users::UsersService;
pub use workouts::WorkoutBook;
