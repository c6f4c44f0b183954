//! Workout commands
//!
//! Routine management, the live session tracker and training history.

use crate::app::AppState;
use crate::database::{CollectionKind, Routine, WorkoutExerciseResult, WorkoutLog};
use crate::error::Result;
use crate::services::workouts::{total_volume, ExerciseDraft, RecommendedWorkout};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of the session in progress
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWorkout {
    pub routine_name: String,
    pub elapsed_seconds: u64,
    pub rest_seconds: Option<u64>,
    pub exercises: Vec<WorkoutExerciseResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumePoint {
    pub date: DateTime<Utc>,
    pub volume: f64,
}

pub async fn list_routines(state: &AppState) -> Result<Vec<Routine>> {
    let ws = state.workspace().await?;
    Ok(ws.workouts.routines().to_vec())
}

pub async fn create_routine(
    state: &AppState,
    name: &str,
    exercises: Vec<ExerciseDraft>,
) -> Result<Routine> {
    let mut ws = state.workspace().await?;
    let routine = ws.workouts.create_routine(name, exercises)?;
    state.persist(&ws, CollectionKind::Routines)?;
    Ok(routine)
}

pub async fn import_routine(state: &AppState, preset: RecommendedWorkout) -> Result<Routine> {
    let mut ws = state.workspace().await?;
    let routine = ws.workouts.import_recommended(preset);
    state.persist(&ws, CollectionKind::Routines)?;
    Ok(routine)
}

/// Delete a routine after confirmation. Logs made from it stay.
pub async fn delete_routine(state: &AppState, id: &str) -> Result<bool> {
    state.confirm("Delete this routine?").await?;

    let mut ws = state.workspace().await?;
    let deleted = ws.workouts.delete_routine(id);
    if deleted {
        state.persist(&ws, CollectionKind::Routines)?;
    } else {
        tracing::warn!("Routine not found: {}, ignoring", id);
    }
    Ok(deleted)
}

fn snapshot(state: &AppState, ws: &crate::app::Workspace) -> Option<ActiveWorkout> {
    let now = state.clock.now();
    ws.workouts.active().map(|session| ActiveWorkout {
        routine_name: session.routine_name().to_string(),
        elapsed_seconds: session.elapsed_seconds(now),
        rest_seconds: session.rest_seconds(now),
        exercises: session.exercises().to_vec(),
    })
}

pub async fn start_workout(state: &AppState, routine_id: &str) -> Result<ActiveWorkout> {
    let mut ws = state.workspace().await?;
    let session = ws.workouts.start(routine_id, state.clock.now())?;
    Ok(ActiveWorkout {
        routine_name: session.routine_name().to_string(),
        elapsed_seconds: 0,
        rest_seconds: None,
        exercises: session.exercises().to_vec(),
    })
}

pub async fn active_workout(state: &AppState) -> Result<Option<ActiveWorkout>> {
    let ws = state.workspace().await?;
    Ok(snapshot(state, &ws))
}

/// Tick or untick a set. Ticking starts the rest timer.
pub async fn toggle_set(state: &AppState, exercise: usize, set: usize) -> Result<bool> {
    let mut ws = state.workspace().await?;
    let effect = ws
        .workouts
        .active_mut()?
        .toggle_set(exercise, set, state.clock.now())?;

    match effect {
        Some(effect) => {
            state.notify(&effect).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub async fn update_set(
    state: &AppState,
    exercise: usize,
    set: usize,
    weight: Option<f64>,
    reps: Option<u32>,
) -> Result<()> {
    let mut ws = state.workspace().await?;
    ws.workouts
        .active_mut()?
        .update_set(exercise, set, weight, reps)
}

pub async fn add_set(state: &AppState, exercise: usize) -> Result<usize> {
    let mut ws = state.workspace().await?;
    ws.workouts.active_mut()?.add_set(exercise)
}

pub async fn finish_workout(state: &AppState) -> Result<WorkoutLog> {
    let mut ws = state.workspace().await?;
    let log = ws.workouts.finish(state.clock.now())?;
    state.persist(&ws, CollectionKind::WorkoutLogs)?;
    Ok(log)
}

/// Abandon the session after confirmation; nothing is logged
pub async fn cancel_workout(state: &AppState) -> Result<bool> {
    if state.workspace().await?.workouts.active().is_none() {
        return Ok(false);
    }
    state
        .confirm("Cancel the workout? Current progress will be lost.")
        .await?;

    let mut ws = state.workspace().await?;
    Ok(ws.workouts.cancel())
}

/// Finished workouts, newest first
pub async fn workout_history(state: &AppState) -> Result<Vec<WorkoutLog>> {
    let ws = state.workspace().await?;
    Ok(ws.workouts.logs().to_vec())
}

/// Training volume per workout, oldest first
pub async fn volume_history(state: &AppState) -> Result<Vec<VolumePoint>> {
    let ws = state.workspace().await?;
    Ok(ws
        .workouts
        .volume_history()
        .into_iter()
        .map(|(date, volume)| VolumePoint { date, volume })
        .collect())
}

/// Volume of the most recent workout, if any
pub async fn last_workout_volume(state: &AppState) -> Result<Option<f64>> {
    let ws = state.workspace().await?;
    Ok(ws.workouts.logs().first().map(total_volume))
}
