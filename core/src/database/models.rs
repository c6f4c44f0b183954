//! Data models
//!
//! Rust structs for every persisted entity. Field names serialize in
//! camelCase so stored blobs keep the shape the views read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a task reschedules itself once completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RepeatType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort weight, higher first
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Work,
    #[default]
    Personal,
    Health,
    Shopping,
    Finance,
    Education,
}

/// Kanban column of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

/// Checklist item inside a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
}

/// A task (reminder). `is_completed == (status == Done)` at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date_time: DateTime<Utc>,
    #[serde(default)]
    pub repeat_type: RepeatType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    pub is_completed: bool,
    pub status: TaskStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlanTier {
    #[default]
    Free,
    Standard,
    Pro,
}

impl PlanTier {
    pub fn is_paid(self) -> bool {
        !matches!(self, PlanTier::Free)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Blue,
    Purple,
    Emerald,
    Rose,
}

/// Public view of an account. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub plan: PlanTier,
    pub xp: u64,
    pub level: u32,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub has_seen_onboarding: bool,
}

impl User {
    /// Custom themes are a paid feature; free accounts always render blue.
    pub fn effective_theme(&self) -> Theme {
        if self.plan.is_paid() {
            self.theme
        } else {
            Theme::Blue
        }
    }
}

/// Account record as stored in the users list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    #[serde(flatten)]
    pub user: User,
    /// Argon2 PHC string
    pub password_hash: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Fields of an account a caller may change. XP and level only move through awards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub plan: Option<PlanTier>,
    pub theme: Option<Theme>,
    pub has_seen_onboarding: Option<bool>,
}

/// Sticky note on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: NoteColor,
    pub z_index: i64,
    #[serde(default)]
    pub is_minimized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Yellow,
    Blue,
    Green,
    Pink,
    Purple,
}

/// Exercise slot inside a routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseTemplate {
    pub id: String,
    pub name: String,
    pub target_sets: u32,
    /// Free text: "12", "10/leg", "45s"
    pub target_reps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub exercises: Vec<ExerciseTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSetResult {
    pub weight: f64,
    pub reps: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExerciseResult {
    pub exercise_name: String,
    pub sets: Vec<WorkoutSetResult>,
}

/// Finished workout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLog {
    pub id: String,
    pub routine_name: String,
    pub date: DateTime<Utc>,
    pub duration_seconds: u64,
    pub exercises: Vec<WorkoutExerciseResult>,
}

/// Per-user collection stored as one JSON blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Reminders,
    Notes,
    Routines,
    WorkoutLogs,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Reminders,
        CollectionKind::Notes,
        CollectionKind::Routines,
        CollectionKind::WorkoutLogs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Reminders => "reminders",
            CollectionKind::Notes => "notes",
            CollectionKind::Routines => "routines",
            CollectionKind::WorkoutLogs => "workout_logs",
        }
    }

    /// Storage key for this collection of the given user
    pub fn key_for(self, user_id: &str) -> String {
        format!("{}_{}", self.as_str(), user_id)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! parse_lowercase {
    ($ty:ty, $what:literal, { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(format!("Unknown {} '{}'", $what, other)),
                }
            }
        }
    };
}

parse_lowercase!(RepeatType, "repeat type", {
    "none" => RepeatType::None,
    "daily" => RepeatType::Daily,
    "weekly" => RepeatType::Weekly,
    "monthly" => RepeatType::Monthly,
});

parse_lowercase!(Priority, "priority", {
    "low" => Priority::Low,
    "medium" => Priority::Medium,
    "high" => Priority::High,
});

parse_lowercase!(Category, "category", {
    "work" => Category::Work,
    "personal" => Category::Personal,
    "health" => Category::Health,
    "shopping" => Category::Shopping,
    "finance" => Category::Finance,
    "education" => Category::Education,
});

parse_lowercase!(TaskStatus, "status", {
    "todo" => TaskStatus::Todo,
    "in_progress" => TaskStatus::InProgress,
    "in-progress" => TaskStatus::InProgress,
    "done" => TaskStatus::Done,
});

parse_lowercase!(PlanTier, "plan", {
    "free" => PlanTier::Free,
    "standard" => PlanTier::Standard,
    "pro" => PlanTier::Pro,
});

parse_lowercase!(Theme, "theme", {
    "blue" => Theme::Blue,
    "purple" => Theme::Purple,
    "emerald" => Theme::Emerald,
    "rose" => Theme::Rose,
});

parse_lowercase!(NoteColor, "note color", {
    "yellow" => NoteColor::Yellow,
    "blue" => NoteColor::Blue,
    "green" => NoteColor::Green,
    "pink" => NoteColor::Pink,
    "purple" => NoteColor::Purple,
});
