//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.
//! The logged-in user's collections live in memory in a `Workspace`; every
//! mutation hands a snapshot to the autosaver.

use crate::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::config::{DATABASE_FILE, DATA_DIR_ENV};
use crate::database::{create_pool, CollectionKind, Note, Repository, Routine, Task, User, WorkoutLog};
use crate::error::{AppError, Result};
use crate::services::effects::{deliver, AlwaysConfirm, ConfirmGate, Effect, EffectSink, LogSink};
use crate::services::{
    AutoSaver, BackupService, NoteBoard, SettingsService, TaskEngine, UsersService, WorkoutBook,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

/// Data directory: explicit path, else `$LUMINA_DATA_DIR`, else `./lumina-data`
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("lumina-data"))
}

/// Swappable outside-world collaborators
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub sink: Arc<dyn EffectSink>,
    pub confirm: Arc<dyn ConfirmGate>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            sink: Arc::new(LogSink),
            confirm: Arc::new(AlwaysConfirm),
        }
    }
}

/// One user's collections, loaded on login
pub struct Workspace {
    pub user: User,
    pub tasks: TaskEngine,
    pub notes: NoteBoard,
    pub workouts: WorkoutBook,
}

/// Central application state holding all services
pub struct AppState {
    pub data_dir: PathBuf,
    pub repo: Repository,
    pub users: UsersService,
    pub settings: SettingsService,
    pub backup: BackupService,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub sink: Arc<dyn EffectSink>,
    pub confirm: Arc<dyn ConfirmGate>,
    workspace: Arc<Mutex<Option<Workspace>>>,
    autosaver: AutoSaver,
}

impl AppState {
    /// Application setup with the real clock, ids, log sink and no prompts
    pub async fn setup(data_dir: &Path) -> Result<Self> {
        Self::setup_with(data_dir, Collaborators::default()).await
    }

    pub async fn setup_with(data_dir: &Path, parts: Collaborators) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("App data directory: {:?}", data_dir);

        // Create necessary directories
        tokio::fs::create_dir_all(data_dir).await?;
        tokio::fs::create_dir_all(data_dir.join("backups")).await?;

        let settings = SettingsService::new(data_dir.to_path_buf());
        let behavior = settings.load().await?.behavior;

        let pool = create_pool(&data_dir.join(DATABASE_FILE)).await?;
        let repo = Repository::new(pool);

        let users = UsersService::new(repo.clone(), parts.clock.clone(), parts.ids.clone());
        users.initialize().await?;

        let autosaver = AutoSaver::spawn(
            repo.clone(),
            Duration::from_millis(u64::from(behavior.auto_save_delay_ms)),
        );

        let state = Self {
            data_dir: data_dir.to_path_buf(),
            backup: BackupService::new(data_dir.to_path_buf()),
            repo,
            users,
            settings,
            clock: parts.clock,
            ids: parts.ids,
            sink: parts.sink,
            confirm: parts.confirm,
            workspace: Arc::new(Mutex::new(None)),
            autosaver,
        };

        if let Some(user) = state.users.refresh_session().await? {
            tracing::info!("Resuming session for {}", user.email);
            state.open_workspace(user).await?;
        }

        tracing::info!("Application initialized successfully");
        Ok(state)
    }

    /// Load a user's collections and make them the active workspace.
    /// Any workspace already open is persisted first.
    pub async fn open_workspace(&self, user: User) -> Result<()> {
        self.close_workspace().await?;

        let tasks: Vec<Task> = self
            .repo
            .load_collection_or_default(CollectionKind::Reminders, &user.id)
            .await;
        let notes: Vec<Note> = self
            .repo
            .load_collection_or_default(CollectionKind::Notes, &user.id)
            .await;
        let routines: Vec<Routine> = self
            .repo
            .load_collection_or_default(CollectionKind::Routines, &user.id)
            .await;
        let logs: Vec<WorkoutLog> = self
            .repo
            .load_collection_or_default(CollectionKind::WorkoutLogs, &user.id)
            .await;

        tracing::debug!(
            "Loaded workspace for {}: {} tasks, {} notes, {} routines, {} logs",
            user.id,
            tasks.len(),
            notes.len(),
            routines.len(),
            logs.len()
        );

        let workspace = Workspace {
            tasks: TaskEngine::new(tasks, self.clock.clone(), self.ids.clone()),
            notes: NoteBoard::new(notes, self.ids.clone()),
            workouts: WorkoutBook::new(routines, logs, self.ids.clone()),
            user,
        };
        *self.workspace.lock().await = Some(workspace);
        Ok(())
    }

    /// Persist and drop the active workspace, if any
    pub async fn close_workspace(&self) -> Result<()> {
        let closed = self.workspace.lock().await.take();
        if let Some(ws) = closed {
            for kind in CollectionKind::ALL {
                self.persist(&ws, kind)?;
            }
            self.autosaver.flush().await?;
            tracing::debug!("Closed workspace for {}", ws.user.id);
        }
        Ok(())
    }

    /// Drop the active workspace without saving it
    pub async fn discard_workspace(&self) {
        self.workspace.lock().await.take();
    }

    /// The active workspace, locked for the caller
    pub async fn workspace(&self) -> Result<MappedMutexGuard<'_, Workspace>> {
        let guard = self.workspace.lock().await;
        MutexGuard::try_map(guard, |ws| ws.as_mut()).map_err(|_| AppError::NoActiveSession)
    }

    /// Shared handle for background readers such as the due watcher
    pub fn workspace_handle(&self) -> Arc<Mutex<Option<Workspace>>> {
        self.workspace.clone()
    }

    /// Queue one collection of the workspace for saving
    pub fn persist(&self, ws: &Workspace, kind: CollectionKind) -> Result<()> {
        let user_id = &ws.user.id;
        match kind {
            CollectionKind::Reminders => {
                self.autosaver.schedule_collection(kind, user_id, ws.tasks.tasks())
            }
            CollectionKind::Notes => self.autosaver.schedule_collection(kind, user_id, ws.notes.notes()),
            CollectionKind::Routines => {
                self.autosaver
                    .schedule_collection(kind, user_id, ws.workouts.routines())
            }
            CollectionKind::WorkoutLogs => {
                self.autosaver.schedule_collection(kind, user_id, ws.workouts.logs())
            }
        }
    }

    /// Write all pending changes now
    pub async fn flush(&self) -> Result<()> {
        self.autosaver.flush().await
    }

    /// Ask before a destructive operation unless confirmation is turned off
    pub async fn confirm(&self, prompt: &str) -> Result<()> {
        if !self.settings.get_behavior().await?.confirm_destructive {
            return Ok(());
        }
        if self.confirm.confirm(prompt) {
            Ok(())
        } else {
            tracing::info!("Cancelled: {}", prompt);
            Err(AppError::Cancelled)
        }
    }

    /// Pass an effect to the sink, with its sound cue when sound is turned on
    pub async fn notify(&self, effect: &Effect) -> Result<()> {
        let sound = self.settings.get_notifications().await?.sound_enabled;
        deliver(self.sink.as_ref(), effect, sound);
        Ok(())
    }

    /// Persist everything and stop background work
    pub async fn shutdown(self) -> Result<()> {
        self.close_workspace().await?;
        self.autosaver.close().await?;
        tracing::info!("Application shut down");
        Ok(())
    }
}
