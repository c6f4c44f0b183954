//! Due-task watcher
//!
//! Polls the active task list on a fixed interval and raises a `TaskDue`
//! effect for every incomplete task whose due time fell inside the last
//! window. Each (task, due time) pair fires at most once.

use crate::clock::Clock;
use crate::database::Task;
use crate::services::effects::{deliver, Effect, EffectSink};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Incomplete tasks with `now - window < due <= now`
pub fn due_now<'a>(tasks: &'a [Task], now: DateTime<Utc>, window: Duration) -> Vec<&'a Task> {
    let start = now - window;
    tasks
        .iter()
        .filter(|t| !t.is_completed && t.due_date_time > start && t.due_date_time <= now)
        .collect()
}

pub struct DueWatcher {
    clock: Arc<dyn Clock>,
    window: Duration,
    fired: HashSet<(String, DateTime<Utc>)>,
}

impl DueWatcher {
    pub fn new(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            clock,
            window,
            fired: HashSet::new(),
        }
    }

    /// One polling pass. Returns effects for tasks not yet announced.
    pub fn check(&mut self, tasks: &[Task]) -> Vec<Effect> {
        let now = self.clock.now();
        let horizon = now - self.window;

        // Entries older than the window can never match again
        self.fired.retain(|(_, due)| *due > horizon);

        due_now(tasks, now, self.window)
            .into_iter()
            .filter(|t| self.fired.insert((t.id.clone(), t.due_date_time)))
            .map(|t| Effect::TaskDue {
                task_id: t.id.clone(),
                title: t.title.clone(),
                priority: t.priority,
            })
            .collect()
    }

    /// Run `check` every `period` on a background task, feeding it whatever
    /// `snapshot` returns. Due effects carry their sound cue when `sound` is
    /// on. Abort the handle to stop.
    pub fn start<F, Fut>(
        mut self,
        period: std::time::Duration,
        sink: Arc<dyn EffectSink>,
        sound: bool,
        snapshot: F,
    ) -> JoinHandle<()>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Vec<Task>> + Send + 'static,
    {
        tokio::spawn(async move {
            tracing::info!("Starting due-task watcher ({}s interval)", period.as_secs());

            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                let tasks = snapshot().await;
                for effect in self.check(&tasks) {
                    deliver(sink.as_ref(), &effect, sound);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::{Category, Priority, RepeatType, TaskStatus};
    use crate::services::effects::RecordingSink;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn task(id: &str, due: DateTime<Utc>, done: bool) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            description: String::new(),
            due_date_time: due,
            repeat_type: RepeatType::None,
            priority: Priority::High,
            category: Category::Work,
            is_completed: done,
            status: if done { TaskStatus::Done } else { TaskStatus::Todo },
            created_at: now() - Duration::days(1),
            subtasks: Vec::new(),
        }
    }

    #[test]
    fn test_due_now_window_bounds() {
        let window = Duration::seconds(60);
        let tasks = vec![
            task("exact", now(), false),
            task("recent", now() - Duration::seconds(30), false),
            task("edge", now() - Duration::seconds(60), false),
            task("future", now() + Duration::seconds(1), false),
            task("done", now() - Duration::seconds(5), true),
        ];

        let ids: Vec<&str> = due_now(&tasks, now(), window)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["exact", "recent"]);
    }

    #[test]
    fn test_each_task_fires_once() {
        let clock = Arc::new(FixedClock::new(now()));
        let mut watcher = DueWatcher::new(clock.clone(), Duration::seconds(60));
        let tasks = vec![task("a", now() - Duration::seconds(5), false)];

        assert_eq!(watcher.check(&tasks).len(), 1);

        clock.advance(Duration::seconds(10));
        assert!(watcher.check(&tasks).is_empty());
    }

    #[test]
    fn test_rescheduled_task_fires_again() {
        let clock = Arc::new(FixedClock::new(now()));
        let mut watcher = DueWatcher::new(clock.clone(), Duration::seconds(60));
        let mut tasks = vec![task("a", now(), false)];
        assert_eq!(watcher.check(&tasks).len(), 1);

        clock.advance(Duration::minutes(5));
        tasks[0].due_date_time = clock.now();
        assert_eq!(watcher.check(&tasks).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_loop_emits_to_sink() {
        let clock = Arc::new(FixedClock::new(now()));
        let sink = Arc::new(RecordingSink::new());
        let watcher = DueWatcher::new(clock, Duration::seconds(60));

        let handle = watcher.start(
            std::time::Duration::from_secs(10),
            sink.clone(),
            true,
            || async { vec![task("a", now(), false)] },
        );

        tokio::time::sleep(std::time::Duration::from_secs(25)).await;
        handle.abort();

        let effects = sink.take();
        assert_eq!(effects.len(), 1);
        assert!(matches!(&effects[0], Effect::TaskDue { task_id, .. } if task_id == "a"));
        assert_eq!(sink.take_sounds(), effects);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_loop_stays_quiet_without_sound() {
        let clock = Arc::new(FixedClock::new(now()));
        let sink = Arc::new(RecordingSink::new());
        let watcher = DueWatcher::new(clock, Duration::seconds(60));

        let handle = watcher.start(
            std::time::Duration::from_secs(10),
            sink.clone(),
            false,
            || async { vec![task("a", now(), false)] },
        );

        tokio::time::sleep(std::time::Duration::from_secs(15)).await;
        handle.abort();

        assert_eq!(sink.take().len(), 1);
        assert!(sink.take_sounds().is_empty());
    }
}
