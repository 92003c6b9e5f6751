use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::geofence::DEFAULT_RADIUS_METERS;

pub const SETTINGS_PATH_ENV: &str = "ATTENDANCE_FLOW_SETTINGS";
pub const DEBUG_ENV: &str = "ATTENDANCE_FLOW_DEBUG";

/// Timing and fallback knobs for a session flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowSettings {
    /// Wait before opening the upload notice, so fast uploads never flash one.
    pub upload_notice_delay_ms: u64,
    /// How long the tracker stays "acquiring" after its first fix or error.
    pub settle_debounce_ms: u64,
    /// Pause on the success screen before leaving the flow.
    pub post_submit_delay_ms: u64,
    pub success_notice_ms: u64,
    /// Used only when a geofence target carries no radius.
    pub default_radius_meters: f64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            upload_notice_delay_ms: 300,
            settle_debounce_ms: 1_000,
            post_submit_delay_ms: 3_000,
            success_notice_ms: 3_000,
            default_radius_meters: DEFAULT_RADIUS_METERS,
        }
    }
}

impl FlowSettings {
    /// Short delays for manual testing.
    pub fn debug_profile() -> Self {
        Self {
            upload_notice_delay_ms: 50,
            settle_debounce_ms: 100,
            post_submit_delay_ms: 300,
            success_notice_ms: 300,
            ..Self::default()
        }
    }

    /// Applies `ATTENDANCE_FLOW_DEBUG=1|true` on top of `self`.
    pub fn with_env_overrides(self) -> Self {
        let debug_mode = std::env::var(DEBUG_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if debug_mode {
            Self {
                default_radius_meters: self.default_radius_meters,
                ..Self::debug_profile()
            }
        } else {
            self
        }
    }

    pub fn upload_notice_delay(&self) -> Duration {
        Duration::from_millis(self.upload_notice_delay_ms)
    }

    pub fn settle_debounce(&self) -> Duration {
        Duration::from_millis(self.settle_debounce_ms)
    }

    pub fn post_submit_delay(&self) -> Duration {
        Duration::from_millis(self.post_submit_delay_ms)
    }

    pub fn success_notice(&self) -> Duration {
        Duration::from_millis(self.success_notice_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredSettings {
    flow: FlowSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<StoredSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unreadable settings in {}: {err}; using defaults",
                    path.display()
                );
                StoredSettings::default()
            })
        } else {
            StoredSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn flow(&self) -> FlowSettings {
        self.read().flow.clone()
    }

    pub fn update_flow(&self, settings: FlowSettings) -> Result<()> {
        let mut guard = self.write();
        guard.flow = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: StoredSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &StoredSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, StoredSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoredSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.flow(), FlowSettings::default());
        assert_eq!(store.flow().upload_notice_delay(), Duration::from_millis(300));
        assert_eq!(store.flow().default_radius_meters, 100.0);
    }

    #[test]
    fn update_persists_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        let mut flow = store.flow();
        flow.post_submit_delay_ms = 1_500;
        store.update_flow(flow).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.flow().post_submit_delay(), Duration::from_millis(1_500));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"flow": {"defaultRadiusMeters": 250.0}}"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.flow().default_radius_meters, 250.0);
        assert_eq!(store.flow().settle_debounce_ms, 1_000);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.flow(), FlowSettings::default());
        assert!(store.reload().is_err());
    }

    #[test]
    fn reload_picks_up_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store.update_flow(FlowSettings::default()).unwrap();

        fs::write(&path, r#"{"flow": {"successNoticeMs": 10}}"#).unwrap();
        store.reload().unwrap();
        assert_eq!(store.flow().success_notice_ms, 10);
    }

    #[test]
    fn debug_profile_keeps_radius() {
        let settings = FlowSettings {
            default_radius_meters: 42.0,
            ..FlowSettings::default()
        };
        let debug = FlowSettings {
            default_radius_meters: settings.default_radius_meters,
            ..FlowSettings::debug_profile()
        };
        assert_eq!(debug.default_radius_meters, 42.0);
        assert!(debug.post_submit_delay() < settings.post_submit_delay());
    }
}
