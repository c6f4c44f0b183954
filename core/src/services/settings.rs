//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config::{
    DEFAULT_AUTO_SAVE_DELAY_MS, DEFAULT_DUE_POLL_INTERVAL_SECS, MAX_AUTO_SAVE_DELAY_MS,
    MAX_DUE_POLL_INTERVAL_SECS, MIN_AUTO_SAVE_DELAY_MS, MIN_DUE_POLL_INTERVAL_SECS,
    SETTINGS_FILE, VALID_LANGUAGES,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Persistence and confirmation behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSettings {
    /// Quiet period before pending changes are written, in milliseconds
    #[serde(default = "default_auto_save_delay")]
    pub auto_save_delay_ms: u32,
    /// Ask before deleting or clearing data
    #[serde(default = "default_true")]
    pub confirm_destructive: bool,
}

fn default_true() -> bool {
    true
}

fn default_auto_save_delay() -> u32 {
    DEFAULT_AUTO_SAVE_DELAY_MS
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            auto_save_delay_ms: default_auto_save_delay(),
            confirm_destructive: true,
        }
    }
}

/// Due-task notification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether to play a sound with each notification
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    DEFAULT_DUE_POLL_INTERVAL_SECS
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound_enabled: true,
            poll_interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppearanceSettings {
    /// `None` follows the system preference
    #[serde(default)]
    pub dark_mode: Option<bool>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            dark_mode: None,
            language: default_language(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub behavior: BehaviorSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub appearance: AppearanceSettings,
}

impl BehaviorSettings {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_AUTO_SAVE_DELAY_MS..=MAX_AUTO_SAVE_DELAY_MS).contains(&self.auto_save_delay_ms) {
            return Err(AppError::Validation(format!(
                "Auto-save delay must be between {} and {} ms",
                MIN_AUTO_SAVE_DELAY_MS, MAX_AUTO_SAVE_DELAY_MS
            )));
        }
        Ok(())
    }
}

impl NotificationSettings {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DUE_POLL_INTERVAL_SECS..=MAX_DUE_POLL_INTERVAL_SECS)
            .contains(&self.poll_interval_secs)
        {
            return Err(AppError::Validation(format!(
                "Poll interval must be between {} and {} seconds",
                MIN_DUE_POLL_INTERVAL_SECS, MAX_DUE_POLL_INTERVAL_SECS
            )));
        }
        Ok(())
    }
}

impl AppearanceSettings {
    pub fn validate(&self) -> Result<()> {
        if !VALID_LANGUAGES.contains(&self.language.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported language: {}",
                self.language
            )));
        }
        Ok(())
    }
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !fs::try_exists(&self.settings_path).await? {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Generic(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn get_behavior(&self) -> Result<BehaviorSettings> {
        Ok(self.load().await?.behavior)
    }

    pub async fn update_behavior(&self, behavior: BehaviorSettings) -> Result<()> {
        behavior.validate()?;
        let mut settings = self.load().await?;
        settings.behavior = behavior;
        self.save(&settings).await
    }

    pub async fn get_notifications(&self) -> Result<NotificationSettings> {
        Ok(self.load().await?.notifications)
    }

    pub async fn update_notifications(&self, notifications: NotificationSettings) -> Result<()> {
        notifications.validate()?;
        let mut settings = self.load().await?;
        settings.notifications = notifications;
        self.save(&settings).await
    }

    pub async fn get_appearance(&self) -> Result<AppearanceSettings> {
        Ok(self.load().await?.appearance)
    }

    pub async fn update_appearance(&self, appearance: AppearanceSettings) -> Result<()> {
        appearance.validate()?;
        let mut settings = self.load().await?;
        settings.appearance = appearance;
        self.save(&settings).await
    }
}
