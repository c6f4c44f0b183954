//! Command line interface
//!
//! Parses arguments with clap and drives the command layer. Output is plain
//! text on stdout; logs go to stderr through tracing.

use crate::app::{resolve_data_dir, AppState, Collaborators};
use crate::commands;
use crate::config::DUE_WINDOW_SECS;
use crate::database::{Category, NoteColor, PlanTier, Priority, RepeatType, Task, TaskStatus};
use crate::services::effects::{AlwaysConfirm, ConfirmGate, Effect, EffectSink, LogSink};
use crate::services::reminders::DueWatcher;
use crate::services::tasks::{NewTask, TaskFilter};
use crate::services::workouts::RecommendedWorkout;
use anyhow::Context;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lumina")]
#[command(about = "Lumina - local-first tasks, notes and workouts")]
#[command(version)]
pub struct Cli {
    /// Data directory (defaults to $LUMINA_DATA_DIR, then ./lumina-data)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Skip confirmation prompts for destructive commands
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and log in
    Register {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in to an existing account
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Add a task from free text, e.g. `lumina add Call mom tonight !high`
    Add {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Add a task with explicit fields
    New {
        #[arg(long)]
        title: String,
        /// Due time, RFC 3339 or "YYYY-MM-DD HH:MM" local
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        repeat: Option<RepeatType>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<Category>,
    },
    /// List tasks
    List {
        #[arg(long, default_value = "active")]
        filter: TaskFilter,
    },
    /// Toggle a task's completion
    Complete { id: String },
    /// Move a task to todo, in_progress or done
    Status { id: String, status: TaskStatus },
    /// Delete a task
    Delete { id: String },
    /// Change the plan tier
    Upgrade { plan: PlanTier },
    /// Sticky notes
    #[command(subcommand)]
    Notes(NoteCommands),
    /// Workout routines and history
    #[command(subcommand)]
    Workout(WorkoutCommands),
    /// Upcoming days with their tasks
    Agenda,
    /// Search tasks and notes
    Search { query: String },
    /// Export tasks and notes to a JSON file
    Export,
    /// Import tasks and notes from an export file
    Import { file: PathBuf },
    /// Dashboard and storage statistics
    Stats,
    /// Erase all data for every account
    Reset,
    /// Announce tasks as they come due until Ctrl-C
    Watch,
    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Subcommand)]
pub enum NoteCommands {
    Add {
        content: String,
        #[arg(long, default_value = "yellow")]
        color: NoteColor,
    },
    List,
    Edit { id: String, content: String },
    Delete { id: String },
    Clear,
}

#[derive(Subcommand)]
pub enum WorkoutCommands {
    /// List routines
    Routines,
    /// Import a recommended routine: full-body, morning, upper, hiit
    Import { preset: RecommendedWorkout },
    /// Delete a routine
    Delete { id: String },
    /// Finished workouts, newest first
    History,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    Show,
    /// Change settings; flags left out keep their value
    Set {
        #[arg(long)]
        auto_save_delay_ms: Option<u32>,
        /// Ask before destructive commands
        #[arg(long)]
        confirm: Option<bool>,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        sound: Option<bool>,
        #[arg(long)]
        poll_interval_secs: Option<u64>,
        /// on, off or system
        #[arg(long)]
        dark_mode: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
}

/// Prints notifications and rings the terminal bell for sound cues
struct TerminalSink;

impl TerminalSink {
    fn message(effect: &Effect) -> Option<String> {
        match effect {
            Effect::TaskDue { title, priority, .. } => {
                Some(format!("Due now: {} ({:?})", title, priority))
            }
            Effect::LevelUp { level } => Some(format!("Level up! You reached level {}", level)),
            Effect::AwardXp { amount } => Some(format!("+{} XP", amount)),
            Effect::SetCompleted { exercise, set_index } => {
                Some(format!("{} set {} done, rest", exercise, set_index + 1))
            }
            // Printed by the command itself
            Effect::OccurrenceScheduled { .. } => None,
        }
    }
}

impl EffectSink for TerminalSink {
    fn emit(&self, effect: &Effect) {
        LogSink.emit(effect);
        if let Some(message) = Self::message(effect) {
            println!("{}", message);
        }
    }

    fn play_sound(&self, _effect: &Effect) {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }
}

/// Prompts on the terminal
struct StdinConfirm;

impl ConfirmGate for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// `on`/`dark`, `off`/`light` or `system`
pub fn parse_dark_mode(input: &str) -> Result<Option<bool>, String> {
    match input.trim().to_lowercase().as_str() {
        "on" | "dark" => Ok(Some(true)),
        "off" | "light" => Ok(Some(false)),
        "system" => Ok(None),
        other => Err(format!("Unknown dark mode '{}', use on, off or system", other)),
    }
}

/// Parse a due time given on the command line
pub fn parse_due(input: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .map_err(|_| format!("Unrecognized due time '{}'", input))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| format!("'{}' does not exist in the local time zone", input))
}

fn print_task(task: &Task) {
    let mark = match task.status {
        TaskStatus::Done => "x",
        TaskStatus::InProgress => "~",
        TaskStatus::Todo => " ",
    };
    println!(
        "[{}] {}  {}  ({:?}, due {})",
        mark,
        task.id,
        task.title,
        task.priority,
        task.due_date_time.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);
    let confirm: Arc<dyn ConfirmGate> = if cli.yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(StdinConfirm)
    };
    let parts = Collaborators {
        sink: Arc::new(TerminalSink),
        confirm,
        ..Collaborators::default()
    };

    let state = AppState::setup_with(&data_dir, parts)
        .await
        .with_context(|| format!("Failed to open data directory {:?}", data_dir))?;

    let result = execute(&state, cli.command).await;
    finish(result, state.shutdown().await)
}

/// The command's own error wins over a failed shutdown, which is only logged
fn finish(result: anyhow::Result<()>, shutdown: crate::error::Result<()>) -> anyhow::Result<()> {
    match (result, shutdown) {
        (Err(e), Err(shutdown_err)) => {
            tracing::error!("Shutdown failed: {}", shutdown_err);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), shutdown) => Ok(shutdown?),
    }
}

async fn execute(state: &AppState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Register {
            name,
            email,
            password,
        } => {
            let user = commands::register(state, &name, &email, &password).await?;
            println!("Welcome, {}! You are logged in.", user.name);
        }
        Commands::Login { email, password } => {
            let user = commands::login(state, &email, &password).await?;
            println!("Logged in as {} (level {})", user.name, user.level);
        }
        Commands::Logout => {
            commands::logout(state).await?;
            println!("Logged out");
        }
        Commands::Whoami => match commands::current_user(state).await? {
            Some(user) => println!(
                "{} <{}>  plan {:?}  level {}  {} XP",
                user.name, user.email, user.plan, user.level, user.xp
            ),
            None => println!("Not logged in"),
        },
        Commands::Add { text } => {
            let task = commands::quick_add_task(state, &text.join(" ")).await?;
            print_task(&task);
        }
        Commands::New {
            title,
            due,
            repeat,
            priority,
            category,
        } => {
            let due_date_time = due
                .map(|raw| parse_due(&raw))
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let task = commands::create_task(
                state,
                NewTask {
                    title: Some(title),
                    due_date_time,
                    repeat_type: repeat,
                    priority,
                    category,
                    ..NewTask::default()
                },
            )
            .await?;
            print_task(&task);
        }
        Commands::List { filter } => {
            let tasks = commands::list_tasks(state, filter).await?;
            if tasks.is_empty() {
                println!("No tasks");
            }
            tasks.iter().for_each(print_task);
        }
        Commands::Complete { id } => match commands::toggle_task(state, &id).await? {
            Some(transition) => {
                print_task(&transition.task);
                if let Some(next) = transition.spawned {
                    print!("Next occurrence: ");
                    print_task(&next);
                }
            }
            None => println!("No task {}", id),
        },
        Commands::Status { id, status } => {
            match commands::set_task_status(state, &id, status).await? {
                Some(transition) => print_task(&transition.task),
                None => println!("No task {}", id),
            }
        }
        Commands::Delete { id } => {
            if commands::delete_task(state, &id).await? {
                println!("Deleted {}", id);
            } else {
                println!("No task {}", id);
            }
        }
        Commands::Upgrade { plan } => {
            let user = commands::change_plan(state, plan).await?;
            println!("{} is now on the {:?} plan", user.name, user.plan);
        }
        Commands::Notes(note_command) => execute_notes(state, note_command).await?,
        Commands::Workout(workout_command) => execute_workout(state, workout_command).await?,
        Commands::Agenda => {
            for day in commands::agenda(state).await? {
                println!("{}", day.date.format("%a %Y-%m-%d"));
                day.tasks.iter().for_each(print_task);
            }
        }
        Commands::Search { query } => {
            let results = commands::global_search(state, &query).await?;
            if results.is_empty() {
                println!("Nothing found for '{}'", query);
            }
            results.tasks.iter().for_each(print_task);
            for note in &results.notes {
                println!("note {}  {}", note.id, note.content);
            }
        }
        Commands::Export => {
            let path = commands::export_data(state).await?;
            println!("Exported to {}", path.display());
        }
        Commands::Import { file } => {
            let summary = commands::import_data(state, &file).await?;
            println!(
                "Imported {} tasks and {} notes",
                summary.reminders.unwrap_or(0),
                summary.notes.unwrap_or(0)
            );
        }
        Commands::Stats => {
            let summary = commands::dashboard(state).await?;
            let stats = commands::admin_stats(state).await?;
            println!(
                "{} pending, {} completed ({:.0}% done)",
                summary.pending,
                summary.completed,
                summary.completion_ratio() * 100.0
            );
            println!(
                "{} users, {} records, {:.2} KiB stored ({:.1}% of quota)",
                stats.user_count, stats.record_count, stats.storage_kib, stats.usage_percent
            );
            for point in &stats.activity {
                println!(
                    "  {}  created {}  completed {}",
                    point.date, point.created, point.completed
                );
            }
        }
        Commands::Reset => {
            commands::factory_reset(state).await?;
            println!("All data erased");
        }
        Commands::Watch => watch(state).await?,
        Commands::Settings(settings_command) => execute_settings(state, settings_command).await?,
    }
    Ok(())
}

async fn execute_settings(state: &AppState, command: SettingsCommands) -> anyhow::Result<()> {
    match command {
        SettingsCommands::Show => {
            let settings = commands::get_settings(state).await?;
            let dark_mode = match settings.appearance.dark_mode {
                Some(true) => "on",
                Some(false) => "off",
                None => "system",
            };
            println!("auto-save delay     {} ms", settings.behavior.auto_save_delay_ms);
            println!("confirm destructive {}", settings.behavior.confirm_destructive);
            println!("notifications       {}", settings.notifications.enabled);
            println!("sound               {}", settings.notifications.sound_enabled);
            println!("poll interval       {} s", settings.notifications.poll_interval_secs);
            println!("dark mode           {}", dark_mode);
            println!("language            {}", settings.appearance.language);
        }
        SettingsCommands::Set {
            auto_save_delay_ms,
            confirm,
            notifications,
            sound,
            poll_interval_secs,
            dark_mode,
            language,
        } => {
            let mut settings = commands::get_settings(state).await?;

            if auto_save_delay_ms.is_some() || confirm.is_some() {
                let behavior = &mut settings.behavior;
                behavior.auto_save_delay_ms = auto_save_delay_ms.unwrap_or(behavior.auto_save_delay_ms);
                behavior.confirm_destructive = confirm.unwrap_or(behavior.confirm_destructive);
                commands::update_behavior_settings(state, settings.behavior).await?;
                if auto_save_delay_ms.is_some() {
                    println!("The new auto-save delay applies from the next start");
                }
            }

            if notifications.is_some() || sound.is_some() || poll_interval_secs.is_some() {
                let current = &mut settings.notifications;
                current.enabled = notifications.unwrap_or(current.enabled);
                current.sound_enabled = sound.unwrap_or(current.sound_enabled);
                current.poll_interval_secs = poll_interval_secs.unwrap_or(current.poll_interval_secs);
                commands::update_notification_settings(state, settings.notifications).await?;
            }

            if dark_mode.is_some() || language.is_some() {
                let appearance = &mut settings.appearance;
                if let Some(raw) = dark_mode {
                    appearance.dark_mode = parse_dark_mode(&raw).map_err(anyhow::Error::msg)?;
                }
                if let Some(language) = language {
                    appearance.language = language;
                }
                commands::update_appearance_settings(state, settings.appearance).await?;
            }

            println!("Settings saved");
        }
    }
    Ok(())
}

async fn execute_notes(state: &AppState, command: NoteCommands) -> anyhow::Result<()> {
    match command {
        NoteCommands::Add { content, color } => {
            let note = commands::create_note(state, &content, color).await?;
            println!("note {}  {}", note.id, note.content);
        }
        NoteCommands::List => {
            for note in commands::list_notes(state).await? {
                println!("note {}  {:?}  {}", note.id, note.color, note.content);
            }
        }
        NoteCommands::Edit { id, content } => {
            if commands::update_note(state, &id, &content).await?.is_none() {
                println!("No note {}", id);
            }
        }
        NoteCommands::Delete { id } => {
            if !commands::delete_note(state, &id).await? {
                println!("No note {}", id);
            }
        }
        NoteCommands::Clear => {
            let count = commands::clear_notes(state).await?;
            println!("Removed {} notes", count);
        }
    }
    Ok(())
}

async fn execute_workout(state: &AppState, command: WorkoutCommands) -> anyhow::Result<()> {
    match command {
        WorkoutCommands::Routines => {
            for routine in commands::list_routines(state).await? {
                println!("{}  {} ({} exercises)", routine.id, routine.name, routine.exercises.len());
            }
        }
        WorkoutCommands::Import { preset } => {
            let routine = commands::import_routine(state, preset).await?;
            println!("Imported {} as {}", routine.name, routine.id);
        }
        WorkoutCommands::Delete { id } => {
            if !commands::delete_routine(state, &id).await? {
                println!("No routine {}", id);
            }
        }
        WorkoutCommands::History => {
            let logs = commands::workout_history(state).await?;
            let volumes = commands::volume_history(state).await?;
            // Volumes are oldest first, logs newest first
            for (log, point) in logs.iter().zip(volumes.iter().rev()) {
                println!(
                    "{}  {}  {} min  volume {:.1}",
                    log.date.with_timezone(&Local).format("%Y-%m-%d"),
                    log.routine_name,
                    log.duration_seconds / 60,
                    point.volume
                );
            }
        }
    }
    Ok(())
}

/// Run the due watcher against the active workspace until Ctrl-C
async fn watch(state: &AppState) -> anyhow::Result<()> {
    // Fails early without a session
    drop(state.workspace().await?);

    let notifications = state.settings.get_notifications().await?;
    if !notifications.enabled {
        println!("Notifications are turned off in settings");
        return Ok(());
    }

    let workspace = state.workspace_handle();
    let watcher = DueWatcher::new(state.clock.clone(), chrono::Duration::seconds(DUE_WINDOW_SECS));
    let handle = watcher.start(
        std::time::Duration::from_secs(notifications.poll_interval_secs),
        state.sink.clone(),
        notifications.sound_enabled,
        move || {
            let workspace = workspace.clone();
            async move {
                workspace
                    .lock()
                    .await
                    .as_ref()
                    .map(|ws| ws.tasks.tasks().to_vec())
                    .unwrap_or_default()
            }
        },
    );

    println!("Watching for due tasks, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    handle.abort();

    tracing::info!("Due watcher stopped");
    Ok(())
}
