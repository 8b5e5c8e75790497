//! Show and change the stored tool settings.

use std::path::PathBuf;

use tracing::info;

use crate::settings::{SettingsManager, ToolSettings};

/// Changes requested on the command line. `None` leaves a value alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    /// Start from defaults before applying the other fields.
    pub reset: bool,
    pub cache_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub pretty_json: Option<bool>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        !self.reset
            && self.cache_dir.is_none()
            && self.log_level.is_none()
            && self.pretty_json.is_none()
    }

    fn apply(self, mut settings: ToolSettings) -> ToolSettings {
        if self.reset {
            settings = ToolSettings::default();
        }
        if let Some(dir) = self.cache_dir {
            settings.cache_dir = Some(dir);
        }
        if let Some(level) = self.log_level {
            settings.log_level = Some(level);
        }
        if let Some(pretty) = self.pretty_json {
            settings.pretty_json = pretty;
        }
        settings
    }
}

/// Apply `update` to the stored settings and return the result.
///
/// An empty update only reads; anything else is written back to disk.
pub fn update_settings(
    manager: &SettingsManager,
    update: SettingsUpdate,
) -> Result<ToolSettings, String> {
    let current = manager.load()?;
    if update.is_empty() {
        return Ok(current);
    }

    let settings = update.apply(current);
    manager.save(&settings)?;

    info!(
        "Saved settings to {} (non-default: {})",
        manager.settings_path().display(),
        settings.has_non_default_settings()
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::temp::TestContext;

    #[test]
    fn test_empty_update_does_not_write() {
        let ctx = TestContext::new();
        let manager = SettingsManager::new(ctx.root());

        let settings = update_settings(&manager, SettingsUpdate::default()).unwrap();

        assert_eq!(settings, ToolSettings::default());
        assert!(!ctx.exists("settings.json"));
    }

    #[test]
    fn test_update_persists() {
        let ctx = TestContext::new();
        let manager = SettingsManager::new(ctx.root());

        let update = SettingsUpdate {
            log_level: Some("debug".into()),
            pretty_json: Some(true),
            ..Default::default()
        };
        let saved = update_settings(&manager, update).unwrap();
        assert_eq!(saved.log_filter(), "debug");
        assert!(saved.pretty_json);

        // A later update keeps what it does not touch.
        let update = SettingsUpdate {
            cache_dir: Some(ctx.cache_dir()),
            ..Default::default()
        };
        let saved = update_settings(&manager, update).unwrap();
        assert_eq!(saved.cache_dir, Some(ctx.cache_dir()));
        assert_eq!(saved.log_filter(), "debug");

        assert_eq!(manager.load().unwrap(), saved);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let ctx = TestContext::new();
        let manager = SettingsManager::new(ctx.root());
        manager
            .save(&ToolSettings {
                log_level: Some("trace".into()),
                pretty_json: true,
                ..Default::default()
            })
            .unwrap();

        let update = SettingsUpdate {
            reset: true,
            pretty_json: Some(true),
            ..Default::default()
        };
        let saved = update_settings(&manager, update).unwrap();

        assert!(saved.log_level.is_none());
        assert!(saved.pretty_json);
        assert_eq!(manager.load().unwrap(), saved);
    }

    #[test]
    fn test_broken_file_is_not_overwritten() {
        let ctx = TestContext::new();
        ctx.create_file("settings.json", "{ not json");
        let manager = SettingsManager::new(ctx.root());

        let update = SettingsUpdate {
            pretty_json: Some(true),
            ..Default::default()
        };
        assert!(update_settings(&manager, update).is_err());
        assert_eq!(ctx.read_file("settings.json"), "{ not json");
    }
}
