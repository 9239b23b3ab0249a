use crate::shared::errors::{EngineError, EngineResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Valid range for the history bound
pub const MAX_HISTORY_MIN: usize = 10;
pub const MAX_HISTORY_MAX: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    /// Upper bound on the number of history entries, in [10, 1000]
    pub max_history: usize,
    /// Global shortcut string, opaque to the engine
    pub shortcut: String,
}

/// Partial settings update; `None` fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub max_history: Option<usize>,
    pub shortcut: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_history: 100,
            shortcut: "CommandOrControl+Option+V".to_string(),
        }
    }
}

impl AppSettings {
    pub fn get_settings_path() -> EngineResult<PathBuf> {
        ProjectDirs::from("com", "antigravity", "clipkeep")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| EngineError::SystemIO("Failed to determine config directory".to_string()))
    }

    pub async fn load() -> EngineResult<Self> {
        let path = Self::get_settings_path()?;

        if !path.exists() {
            let settings = Self::default();
            settings.save().await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| EngineError::SystemIO(format!("Failed to read settings file: {}", e)))?;

        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| EngineError::InvalidInput(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub async fn save(&self) -> EngineResult<()> {
        self.validate()?;
        let path = Self::get_settings_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| EngineError::SystemIO(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::InvalidInput(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&path, content)
            .await
            .map_err(|e| EngineError::SystemIO(format!("Failed to write settings file: {}", e)))
    }

    /// Merge a partial update, rejecting out-of-range values before they
    /// can reach the engine
    pub fn apply(&mut self, patch: SettingsPatch) -> EngineResult<()> {
        if let Some(max_history) = patch.max_history {
            if !(MAX_HISTORY_MIN..=MAX_HISTORY_MAX).contains(&max_history) {
                return Err(EngineError::InvalidInput(format!(
                    "max_history must be between {} and {}, got {}",
                    MAX_HISTORY_MIN, MAX_HISTORY_MAX, max_history
                )));
            }
            self.max_history = max_history;
        }
        if let Some(shortcut) = patch.shortcut {
            if shortcut.is_empty() {
                return Err(EngineError::InvalidInput("shortcut must not be empty".to_string()));
            }
            self.shortcut = shortcut;
        }
        Ok(())
    }

    fn validate(&self) -> EngineResult<()> {
        if !(MAX_HISTORY_MIN..=MAX_HISTORY_MAX).contains(&self.max_history) {
            return Err(EngineError::InvalidInput(format!(
                "max_history out of range: {}",
                self.max_history
            )));
        }
        Ok(())
    }
}
