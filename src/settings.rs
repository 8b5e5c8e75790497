//! Tool settings with persistence.
//!
//! This module provides:
//! - `ToolSettings` struct for the command-line tool
//! - Persistence to a JSON file in the app data directory, or any file
//!   passed with `--config`
//!
//! Command-line flags always win over stored values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the platform data directory.
const APP_DIR_NAME: &str = "g2tool";

/// Settings file name stored in app data directory.
const SETTINGS_FILENAME: &str = "settings.json";

/// Fingerprint cache directory under the app data directory.
const CACHE_DIRNAME: &str = "fingerprints";

/// Log filter used when neither `G2_LOG` nor the settings name one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Settings for the command-line tool.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    /// Where per-device fingerprints are stored. Defaults to `fingerprints`
    /// under the platform data directory, wherever the settings file lives.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// `tracing` filter directive, e.g. "debug" or "scubapro_g2=trace".
    #[serde(default)]
    pub log_level: Option<String>,

    /// Indent JSON output.
    #[serde(default)]
    pub pretty_json: bool,
}

impl ToolSettings {
    /// Fingerprint cache directory, falling back to `fingerprints` under
    /// `app_data_dir`.
    pub fn cache_dir_or(&self, app_data_dir: &Path) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| app_data_dir.join(CACHE_DIRNAME))
    }

    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Check if these settings differ from defaults.
    pub fn has_non_default_settings(&self) -> bool {
        *self != Self::default()
    }
}

/// Platform data directory for the tool.
pub fn default_app_data_dir() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| "Failed to get app data directory".to_string())
}

/// Manages persistence of tool settings to JSON file.
pub struct SettingsManager {
    settings_file_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager for the given app data directory.
    pub fn new(app_data_dir: &Path) -> Self {
        let settings_file_path = app_data_dir.join(SETTINGS_FILENAME);
        Self { settings_file_path }
    }

    /// Use an explicit settings file instead of the app data directory.
    pub fn from_file(path: &Path) -> Self {
        Self {
            settings_file_path: path.to_path_buf(),
        }
    }

    /// Load settings from disk, returning defaults if file doesn't exist.
    pub fn load(&self) -> Result<ToolSettings, String> {
        if !self.settings_file_path.exists() {
            return Ok(ToolSettings::default());
        }

        let contents = fs::read_to_string(&self.settings_file_path)
            .map_err(|e| format!("Failed to read settings file: {}", e))?;

        // Handle empty file gracefully
        if contents.trim().is_empty() {
            return Ok(ToolSettings::default());
        }

        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse settings JSON: {}", e))
    }

    /// Save settings to disk.
    pub fn save(&self, settings: &ToolSettings) -> Result<(), String> {
        // Ensure parent directory exists
        if let Some(parent) = self.settings_file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let contents = serde_json::to_string_pretty(settings)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(&self.settings_file_path, contents)
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }

    /// Get the path where settings are stored.
    pub fn settings_path(&self) -> &Path {
        &self.settings_file_path
    }
}
