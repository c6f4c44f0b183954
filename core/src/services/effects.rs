//! Side effects as values
//!
//! Engine operations never play sounds or raise notifications themselves.
//! They return `Effect`s, and the command layer hands them to an
//! `EffectSink`. Destructive commands ask a `ConfirmGate` first.

use crate::database::Priority;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effect {
    /// XP earned by the active user; subject to the plan tier gate
    AwardXp { amount: u64 },
    /// An XP award crossed a level threshold
    LevelUp { level: u32 },
    /// Completing a repeating task produced its next occurrence
    OccurrenceScheduled { task_id: String, due: DateTime<Utc> },
    /// A task just became due
    TaskDue {
        task_id: String,
        title: String,
        priority: Priority,
    },
    /// A workout set was ticked off and the rest timer started
    SetCompleted { exercise: String, set_index: usize },
}

impl Effect {
    /// Due tasks, level ups and finished sets come with a sound cue
    pub fn has_sound(&self) -> bool {
        matches!(
            self,
            Effect::TaskDue { .. } | Effect::LevelUp { .. } | Effect::SetCompleted { .. }
        )
    }
}

/// Notification and sound side-channel
pub trait EffectSink: Send + Sync {
    fn emit(&self, effect: &Effect);

    /// Play the cue for an effect. Only called through `deliver`, when
    /// sound is turned on.
    fn play_sound(&self, _effect: &Effect) {}
}

/// Hand an effect to the sink, with its sound cue if `sound` is on
pub fn deliver(sink: &dyn EffectSink, effect: &Effect, sound: bool) {
    sink.emit(effect);
    if sound && effect.has_sound() {
        sink.play_sound(effect);
    }
}

/// Sink that writes effects to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EffectSink for LogSink {
    fn emit(&self, effect: &Effect) {
        match effect {
            Effect::TaskDue { title, priority, .. } => {
                tracing::info!("Task due: {} ({:?})", title, priority)
            }
            Effect::LevelUp { level } => tracing::info!("Level up! Now level {}", level),
            Effect::OccurrenceScheduled { task_id, due } => {
                tracing::info!("Next occurrence {} scheduled for {}", task_id, due)
            }
            Effect::SetCompleted { exercise, set_index } => {
                tracing::info!("Set {} of {} done, resting", set_index + 1, exercise)
            }
            Effect::AwardXp { amount } => tracing::debug!("XP earned: {}", amount),
        }
    }

    fn play_sound(&self, effect: &Effect) {
        tracing::debug!("Sound cue for {:?}", effect);
    }
}

/// Sink that keeps every effect it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    effects: Mutex<Vec<Effect>>,
    sounds: Mutex<Vec<Effect>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Effect> {
        let mut guard = self.effects.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }

    /// Effects whose sound cue was played, drained
    pub fn take_sounds(&self) -> Vec<Effect> {
        let mut guard = self.sounds.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }
}

impl EffectSink for RecordingSink {
    fn emit(&self, effect: &Effect) {
        self.effects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(effect.clone());
    }

    fn play_sound(&self, effect: &Effect) {
        self.sounds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(effect.clone());
    }
}

/// Confirmation prompt consulted before destructive operations
pub trait ConfirmGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Gate that always proceeds
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl ConfirmGate for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Gate that always cancels
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverConfirm;

impl ConfirmGate for NeverConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_drains() {
        let sink = RecordingSink::new();
        sink.emit(&Effect::LevelUp { level: 4 });
        sink.emit(&Effect::AwardXp { amount: 50 });

        assert_eq!(sink.take().len(), 2);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_deliver_plays_sound_only_when_on() {
        let sink = RecordingSink::new();
        deliver(&sink, &Effect::LevelUp { level: 3 }, true);
        deliver(&sink, &Effect::AwardXp { amount: 50 }, true);
        deliver(&sink, &Effect::LevelUp { level: 4 }, false);

        assert_eq!(sink.take().len(), 3);
        assert_eq!(sink.take_sounds(), vec![Effect::LevelUp { level: 3 }]);
    }

    #[test]
    fn test_effect_serializes_with_tag() {
        let value = serde_json::to_value(Effect::LevelUp { level: 2 }).unwrap();
        assert_eq!(value["type"], "levelUp");
        assert_eq!(value["level"], 2);
    }
}
