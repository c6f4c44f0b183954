//! Commands exposed to callers (the CLI, tests)
//!
//! This module organizes commands into logical submodules:
//! - `tasks`: Task lifecycle, smart input and list views
//! - `users`: Accounts, session and plan changes
//! - `notes`: Sticky notes board
//! - `workouts`: Routines, live sessions and history
//! - `insights`: Dashboard, calendar, search and admin tools
//! - `backup`: JSON export and import
//! - `settings`: Application settings
//!
//! Commands work on the active workspace and queue a save after every
//! mutation. Lookups of ids that no longer exist are logged and treated as
//! no-ops.

pub mod backup;
pub mod insights;
pub mod notes;
pub mod settings;
pub mod tasks;
pub mod users;
pub mod workouts;

use crate::app::{AppState, Workspace};
use crate::error::Result;
use crate::services::effects::Effect;

pub use backup::*;
pub use insights::*;
pub use notes::*;
pub use settings::*;
pub use tasks::*;
pub use users::*;
pub use workouts::*;

// ===== General Commands =====

/// Get application information
pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        app_data_dir: state.data_dir.to_string_lossy().to_string(),
    }
}

/// Application information structure
#[derive(Debug, serde::Serialize)]
pub struct AppInfo {
    pub version: String,
    pub app_data_dir: String,
}

/// Turn a NotFound into `None`
fn ignore_not_found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            tracing::warn!("{}, ignoring", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Carry out engine effects. XP goes through the user repository (and its
/// plan gate); everything else is handed to the sink.
async fn dispatch(state: &AppState, ws: &mut Workspace, effects: Vec<Effect>) -> Result<()> {
    for effect in effects {
        match effect {
            Effect::AwardXp { amount } => {
                let Some(award) = state.users.award_xp(&ws.user.id, amount).await? else {
                    continue;
                };
                ws.user.xp = award.xp;
                ws.user.level = award.level;
                state.notify(&Effect::AwardXp { amount }).await?;
                if award.leveled_up() {
                    tracing::info!("User {} reached level {}", ws.user.id, award.level);
                    state.notify(&Effect::LevelUp { level: award.level }).await?;
                }
            }
            other => state.notify(&other).await?,
        }
    }
    Ok(())
}
