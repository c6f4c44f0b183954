//! Workout routines, live sessions and training history
//!
//! A `WorkoutBook` holds one user's routines and logs plus at most one
//! session in progress. Finishing a session prepends its log so history is
//! newest first.

use crate::clock::IdGenerator;
use crate::config::{DEFAULT_TARGET_REPS, DEFAULT_TARGET_SETS};
use crate::database::{
    ExerciseTemplate, Routine, WorkoutExerciseResult, WorkoutLog, WorkoutSetResult,
};
use crate::error::{AppError, Result};
use crate::services::effects::Effect;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

/// Built-in routines offered for one-click import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendedWorkout {
    FullBody,
    MorningStretch,
    UpperBody,
    Hiit,
}

impl RecommendedWorkout {
    pub const ALL: [RecommendedWorkout; 4] = [
        RecommendedWorkout::FullBody,
        RecommendedWorkout::MorningStretch,
        RecommendedWorkout::UpperBody,
        RecommendedWorkout::Hiit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RecommendedWorkout::FullBody => "Full Body Beginner",
            RecommendedWorkout::MorningStretch => "Morning Stretch",
            RecommendedWorkout::UpperBody => "Upper Body Dumbbells",
            RecommendedWorkout::Hiit => "Quick HIIT",
        }
    }

    /// (exercise, sets, reps)
    fn exercises(self) -> &'static [(&'static str, u32, &'static str)] {
        match self {
            RecommendedWorkout::FullBody => &[
                ("Squats", 3, "15"),
                ("Push-ups", 3, "12"),
                ("Lunges", 3, "10/leg"),
                ("Plank", 3, "45s"),
                ("Jumping Jacks", 3, "50"),
            ],
            RecommendedWorkout::MorningStretch => &[
                ("Neck Rolls", 2, "30s"),
                ("Cat-Cow", 2, "10"),
                ("Child's Pose", 2, "45s"),
                ("Shoulder Circles", 2, "20"),
            ],
            RecommendedWorkout::UpperBody => &[
                ("Shoulder Press", 3, "12"),
                ("Bicep Curls", 3, "12"),
                ("Bent-over Rows", 3, "12"),
                ("Tricep Extensions", 3, "15"),
                ("Lateral Raises", 3, "15"),
            ],
            RecommendedWorkout::Hiit => &[
                ("High Knees", 4, "30s"),
                ("Mountain Climbers", 4, "30s"),
                ("Burpees", 4, "10"),
                ("Jump Squats", 4, "15"),
            ],
        }
    }
}

impl FromStr for RecommendedWorkout {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "full-body" | "fullbody" => Ok(RecommendedWorkout::FullBody),
            "morning" | "morning-stretch" => Ok(RecommendedWorkout::MorningStretch),
            "upper" | "upper-body" => Ok(RecommendedWorkout::UpperBody),
            "hiit" => Ok(RecommendedWorkout::Hiit),
            other => Err(AppError::Validation(format!(
                "Unknown recommended workout: {}",
                other
            ))),
        }
    }
}

/// Exercise as entered when building a routine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDraft {
    pub name: String,
    pub target_sets: Option<u32>,
    pub target_reps: Option<String>,
}

/// Workout in progress
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    routine_name: String,
    started_at: DateTime<Utc>,
    exercises: Vec<WorkoutExerciseResult>,
    resting_since: Option<DateTime<Utc>>,
}

impl WorkoutSession {
    /// One empty set per target set of every exercise
    pub fn start(routine: &Routine, now: DateTime<Utc>) -> Self {
        let exercises = routine
            .exercises
            .iter()
            .map(|ex| WorkoutExerciseResult {
                exercise_name: ex.name.clone(),
                sets: vec![WorkoutSetResult::default(); ex.target_sets as usize],
            })
            .collect();

        Self {
            routine_name: routine.name.clone(),
            started_at: now,
            exercises,
            resting_since: None,
        }
    }

    pub fn routine_name(&self) -> &str {
        &self.routine_name
    }

    pub fn exercises(&self) -> &[WorkoutExerciseResult] {
        &self.exercises
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }

    /// Seconds since the last completed set, if resting
    pub fn rest_seconds(&self, now: DateTime<Utc>) -> Option<u64> {
        self.resting_since
            .map(|since| (now - since).num_seconds().max(0) as u64)
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> Result<&mut WorkoutSetResult> {
        self.exercises
            .get_mut(exercise)
            .and_then(|ex| ex.sets.get_mut(set))
            .ok_or_else(|| {
                AppError::Validation(format!("No set {} in exercise {}", set, exercise))
            })
    }

    /// Flip a set's completion. Completing a set restarts the rest timer.
    pub fn toggle_set(
        &mut self,
        exercise: usize,
        set: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<Effect>> {
        let entry = self.set_mut(exercise, set)?;
        entry.completed = !entry.completed;
        if !entry.completed {
            return Ok(None);
        }

        self.resting_since = Some(now);
        Ok(Some(Effect::SetCompleted {
            exercise: self.exercises[exercise].exercise_name.clone(),
            set_index: set,
        }))
    }

    pub fn update_set(
        &mut self,
        exercise: usize,
        set: usize,
        weight: Option<f64>,
        reps: Option<u32>,
    ) -> Result<()> {
        let entry = self.set_mut(exercise, set)?;
        if let Some(weight) = weight {
            entry.weight = weight;
        }
        if let Some(reps) = reps {
            entry.reps = reps;
        }
        Ok(())
    }

    /// Append an empty set; returns its index
    pub fn add_set(&mut self, exercise: usize) -> Result<usize> {
        let ex = self
            .exercises
            .get_mut(exercise)
            .ok_or_else(|| AppError::Validation(format!("No exercise {}", exercise)))?;
        ex.sets.push(WorkoutSetResult::default());
        Ok(ex.sets.len() - 1)
    }

    pub fn stop_rest(&mut self) {
        self.resting_since = None;
    }

    fn into_log(self, id: String, now: DateTime<Utc>) -> WorkoutLog {
        WorkoutLog {
            id,
            duration_seconds: self.elapsed_seconds(now),
            routine_name: self.routine_name,
            date: now,
            exercises: self.exercises,
        }
    }
}

/// Sum of weight × reps over every set of a log
pub fn total_volume(log: &WorkoutLog) -> f64 {
    log.exercises
        .iter()
        .flat_map(|ex| ex.sets.iter())
        .map(|s| s.weight * f64::from(s.reps))
        .sum()
}

pub struct WorkoutBook {
    routines: Vec<Routine>,
    logs: Vec<WorkoutLog>,
    active: Option<WorkoutSession>,
    ids: Arc<dyn IdGenerator>,
}

impl WorkoutBook {
    pub fn new(routines: Vec<Routine>, logs: Vec<WorkoutLog>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            routines,
            logs,
            active: None,
            ids,
        }
    }

    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    /// Newest first
    pub fn logs(&self) -> &[WorkoutLog] {
        &self.logs
    }

    pub fn create_routine(&mut self, name: &str, exercises: Vec<ExerciseDraft>) -> Result<Routine> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Routine name is required".to_string()));
        }

        let exercises = exercises
            .into_iter()
            .map(|draft| ExerciseTemplate {
                id: self.ids.next_id(),
                name: draft.name.trim().to_string(),
                target_sets: draft.target_sets.unwrap_or(DEFAULT_TARGET_SETS),
                target_reps: draft
                    .target_reps
                    .unwrap_or_else(|| DEFAULT_TARGET_REPS.to_string()),
            })
            .collect();

        let routine = Routine {
            id: self.ids.next_id(),
            name: name.to_string(),
            exercises,
        };

        tracing::info!("Created routine {} ({})", routine.name, routine.id);
        self.routines.push(routine.clone());
        Ok(routine)
    }

    pub fn import_recommended(&mut self, preset: RecommendedWorkout) -> Routine {
        let exercises = preset
            .exercises()
            .iter()
            .map(|(name, sets, reps)| ExerciseTemplate {
                id: self.ids.next_id(),
                name: (*name).to_string(),
                target_sets: *sets,
                target_reps: (*reps).to_string(),
            })
            .collect();

        let routine = Routine {
            id: self.ids.next_id(),
            name: preset.name().to_string(),
            exercises,
        };

        tracing::info!("Imported recommended routine {}", routine.name);
        self.routines.push(routine.clone());
        routine
    }

    pub fn delete_routine(&mut self, id: &str) -> bool {
        let before = self.routines.len();
        self.routines.retain(|r| r.id != id);
        self.routines.len() != before
    }

    pub fn active(&self) -> Option<&WorkoutSession> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Result<&mut WorkoutSession> {
        self.active
            .as_mut()
            .ok_or_else(|| AppError::Validation("No workout in progress".to_string()))
    }

    /// Start a session from a routine, replacing any session in progress
    pub fn start(&mut self, routine_id: &str, now: DateTime<Utc>) -> Result<&WorkoutSession> {
        let routine = self
            .routines
            .iter()
            .find(|r| r.id == routine_id)
            .ok_or_else(|| AppError::RoutineNotFound(routine_id.to_string()))?;

        if let Some(previous) = &self.active {
            tracing::warn!("Discarding unfinished workout {}", previous.routine_name);
        }

        tracing::info!("Starting workout {}", routine.name);
        Ok(self.active.insert(WorkoutSession::start(routine, now)))
    }

    /// Close the session and prepend its log
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<WorkoutLog> {
        let session = self
            .active
            .take()
            .ok_or_else(|| AppError::Validation("No workout in progress".to_string()))?;

        let log = session.into_log(self.ids.next_id(), now);
        tracing::info!(
            "Finished workout {} in {}s",
            log.routine_name,
            log.duration_seconds
        );
        self.logs.insert(0, log.clone());
        Ok(log)
    }

    /// Drop the session without logging it
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// (date, volume) per log, oldest first
    pub fn volume_history(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.logs
            .iter()
            .rev()
            .map(|log| (log.date, total_volume(log)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SequentialIds;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap()
    }

    fn create_test_book() -> WorkoutBook {
        WorkoutBook::new(Vec::new(), Vec::new(), Arc::new(SequentialIds::new("w")))
    }

    #[test]
    fn test_create_routine_requires_name() {
        let mut book = create_test_book();

        assert!(book.create_routine("   ", Vec::new()).is_err());

        let routine = book
            .create_routine(
                "Legs",
                vec![ExerciseDraft {
                    name: "Squat".to_string(),
                    ..ExerciseDraft::default()
                }],
            )
            .unwrap();
        assert_eq!(routine.exercises[0].target_sets, DEFAULT_TARGET_SETS);
        assert_eq!(routine.exercises[0].target_reps, DEFAULT_TARGET_REPS);
        assert_eq!(book.routines().len(), 1);
    }

    #[test]
    fn test_import_every_preset() {
        let mut book = create_test_book();
        for preset in RecommendedWorkout::ALL {
            let routine = book.import_recommended(preset);
            assert!(!routine.exercises.is_empty());
        }
        assert_eq!(book.routines().len(), 4);
        assert_eq!(
            "hiit".parse::<RecommendedWorkout>().unwrap(),
            RecommendedWorkout::Hiit
        );
    }

    #[test]
    fn test_session_lifecycle() {
        let mut book = create_test_book();
        let routine = book.import_recommended(RecommendedWorkout::Hiit);

        let session = book.start(&routine.id, now()).unwrap();
        assert_eq!(session.exercises().len(), 4);
        assert_eq!(session.exercises()[0].sets.len(), 4);

        let session = book.active_mut().unwrap();
        session.update_set(2, 0, Some(10.0), Some(8)).unwrap();
        let effect = session.toggle_set(2, 0, now()).unwrap();
        assert_eq!(
            effect,
            Some(Effect::SetCompleted {
                exercise: "Burpees".to_string(),
                set_index: 0
            })
        );
        assert_eq!(session.rest_seconds(now() + Duration::seconds(30)), Some(30));

        // Unticking produces no effect
        assert_eq!(session.toggle_set(2, 0, now()).unwrap(), None);
        assert!(session.toggle_set(9, 0, now()).is_err());

        assert_eq!(session.add_set(2).unwrap(), 4);

        let log = book.finish(now() + Duration::minutes(20)).unwrap();
        assert_eq!(log.duration_seconds, 1200);
        assert_eq!(log.exercises[2].sets.len(), 5);
        assert!(book.active().is_none());
        assert!(book.finish(now()).is_err());
    }

    #[test]
    fn test_start_missing_routine() {
        let mut book = create_test_book();
        assert!(book.start("nope", now()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_cancel_does_not_log() {
        let mut book = create_test_book();
        let routine = book.import_recommended(RecommendedWorkout::MorningStretch);
        book.start(&routine.id, now()).unwrap();

        assert!(book.cancel());
        assert!(!book.cancel());
        assert!(book.logs().is_empty());
    }

    #[test]
    fn test_volume_history_oldest_first() {
        let mut book = create_test_book();
        let routine = book.import_recommended(RecommendedWorkout::UpperBody);

        for (day, weight) in [(0, 10.0), (1, 12.5)] {
            let started = now() + Duration::days(day);
            book.start(&routine.id, started).unwrap();
            book.active_mut()
                .unwrap()
                .update_set(0, 0, Some(weight), Some(10))
                .unwrap();
            book.finish(started + Duration::minutes(30)).unwrap();
        }

        // Logs are newest first, history is oldest first
        assert_eq!(total_volume(&book.logs()[0]), 125.0);
        let history = book.volume_history();
        assert_eq!(history[0].1, 100.0);
        assert_eq!(history[1].1, 125.0);
    }
}
