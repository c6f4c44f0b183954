//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

// ===== Persistence Keys =====

/// Key holding the JSON list of every registered user
pub const USERS_DB_KEY: &str = "lumina_users_db";

/// Key holding the cached copy of the logged-in user
pub const ACTIVE_SESSION_KEY: &str = "lumina_active_session";

/// SQLite file name inside the data directory
pub const DATABASE_FILE: &str = "lumina.sqlite";

/// Settings file name inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "LUMINA_DATA_DIR";

// ===== Gamification =====

/// XP granted for each task completion (paid tiers only)
pub const XP_PER_COMPLETION: u64 = 50;

// ===== Task Defaults =====

/// Title used when a task is created without one
pub const DEFAULT_TASK_TITLE: &str = "New Task";

/// Hour of day used by the "tomorrow" and "next week" smart-input hints
pub const SMART_INPUT_MORNING_HOUR: u32 = 9;

/// Hour of day used by the "tonight" smart-input hint
pub const SMART_INPUT_EVENING_HOUR: u32 = 19;

// ===== Due Notifications =====

/// Default interval between due-task sweeps in seconds
pub const DEFAULT_DUE_POLL_INTERVAL_SECS: u64 = 10;

/// Minimum due-task sweep interval in seconds
pub const MIN_DUE_POLL_INTERVAL_SECS: u64 = 1;

/// Maximum due-task sweep interval in seconds.
/// Must stay below the due window or tasks can slip through unannounced.
pub const MAX_DUE_POLL_INTERVAL_SECS: u64 = 59;

/// A task counts as "just became due" for this many seconds after its due time
pub const DUE_WINDOW_SECS: i64 = 60;

// ===== Behavior Settings Limits =====

/// Default quiet period before a burst of changes is persisted
pub const DEFAULT_AUTO_SAVE_DELAY_MS: u32 = 500;

/// Minimum auto-save delay in milliseconds.
pub const MIN_AUTO_SAVE_DELAY_MS: u32 = 50;

/// Maximum auto-save delay in milliseconds (1 minute).
/// Values above this risk losing a large window on unexpected shutdown.
pub const MAX_AUTO_SAVE_DELAY_MS: u32 = 60_000;

/// Supported interface languages
pub const VALID_LANGUAGES: &[&str] = &["en", "ru"];

// ===== Views =====

/// Maximum hits per entity kind returned by global search
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// Number of upcoming tasks shown on the dashboard
pub const UPCOMING_TASK_LIMIT: usize = 3;

/// Number of days covered by the calendar agenda
pub const AGENDA_DAYS: i64 = 14;

/// Leading agenda days always shown even when empty
pub const AGENDA_MIN_DAYS: i64 = 3;

/// Days covered by the admin activity series
pub const ACTIVITY_DAYS: i64 = 7;

/// Storage budget the admin usage gauge is measured against (5 MiB)
pub const STORAGE_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

// ===== Sticky Notes =====

/// Default sticky note edge length in board pixels
pub const NOTE_DEFAULT_SIZE: f64 = 240.0;

/// New notes are dropped at a random offset in [NOTE_SPAWN_MIN, NOTE_SPAWN_MIN + NOTE_SPAWN_SPREAD)
pub const NOTE_SPAWN_MIN: f64 = 60.0;
pub const NOTE_SPAWN_SPREAD: f64 = 100.0;

// ===== Workouts =====

/// Sets given to an exercise added without an explicit target
pub const DEFAULT_TARGET_SETS: u32 = 3;

/// Reps given to an exercise added without an explicit target
pub const DEFAULT_TARGET_REPS: &str = "10";
