//! Settings-related commands
//!
//! Commands for reading and updating behavior, notification and appearance
//! settings. Updates are validated before they are written.

use crate::app::AppState;
use crate::error::Result;
use crate::services::settings::{
    AppSettings, AppearanceSettings, BehaviorSettings, NotificationSettings,
};

pub async fn get_settings(state: &AppState) -> Result<AppSettings> {
    state.settings.load().await
}

/// Update behavior settings.
/// Note: a new auto-save delay takes effect on the next start.
pub async fn update_behavior_settings(state: &AppState, behavior: BehaviorSettings) -> Result<()> {
    state.settings.update_behavior(behavior).await
}

pub async fn update_notification_settings(
    state: &AppState,
    notifications: NotificationSettings,
) -> Result<()> {
    state.settings.update_notifications(notifications).await
}

pub async fn update_appearance_settings(
    state: &AppState,
    appearance: AppearanceSettings,
) -> Result<()> {
    state.settings.update_appearance(appearance).await
}
