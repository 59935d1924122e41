use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, PersistenceError};
use crate::hotkey::{Hotkey, HotkeyBindings};
use crate::models::DEFAULT_CAPACITY;

/// File name of the settings inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

const MIN_POLL_INTERVAL_MS: u64 = 50;
const MAX_POLL_INTERVAL_MS: u64 = 5_000;
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// `ConfigError::field` used when the file as a whole could not be used
pub const WHOLE_FILE: &str = "settings";

/// User settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Register with the OS to start at login (applied by OS integration, not here)
    pub run_at_startup: bool,

    /// Show transient notifications, e.g. when a paste fails
    pub show_notifications: bool,

    /// Hotkey that opens the overlay, e.g. "ctrl+q"; "none" disables it
    pub open_hotkey: String,

    /// Hotkey that advances the cursor while the modifier is held
    pub cycle_hotkey: String,

    /// Maximum number of history entries
    pub stack_size: usize,

    /// Dark overlay palette
    pub dark_mode: bool,

    /// Clipboard polling interval
    pub poll_interval_ms: u64,

    /// Delay between writing the clipboard and sending the paste keystroke
    pub paste_delay_ms: u64,

    /// Log file level: error, warn, info, debug or trace
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            run_at_startup: false,
            show_notifications: true,
            open_hotkey: "ctrl+q".to_string(),
            cycle_hotkey: "ctrl+q".to_string(),
            stack_size: DEFAULT_CAPACITY,
            dark_mode: false,
            poll_interval_ms: 250,
            paste_delay_ms: 100,
            log_level: "info".to_string(),
        }
    }
}

/// Settings plus every field that had to fall back to its default
#[derive(Debug, Clone, Default)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub errors: Vec<ConfigError>,
}

impl LoadedSettings {
    /// Defaults, because the file could not be read or parsed at all
    fn unusable(reason: impl Into<String>) -> Self {
        let error = ConfigError::new(WHOLE_FILE, reason);
        log::warn!("Settings: {}, using defaults", error);
        LoadedSettings {
            settings: Settings::default(),
            errors: vec![error],
        }
    }

    /// Whether nothing in the file could be used. Such a load says nothing
    /// about the user's intent, e.g. a file caught mid-write.
    pub fn is_unusable(&self) -> bool {
        self.errors.iter().any(|e| e.field == WHOLE_FILE)
    }
}

/// Decode one field, recording a `ConfigError` when present but malformed.
/// `legacy` is consulted only when `key` is absent.
fn decode_field<T: DeserializeOwned>(
    map: &Map<String, Value>,
    key: &'static str,
    legacy: Option<&str>,
    errors: &mut Vec<ConfigError>,
) -> Option<T> {
    let value = map.get(key).or_else(|| legacy.and_then(|l| map.get(l)))?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(ConfigError::new(key, e.to_string()));
            None
        }
    }
}

fn validate_hotkey(value: String, field: &'static str, errors: &mut Vec<ConfigError>) -> Option<String> {
    match Hotkey::parse(&value) {
        Ok(Some(hotkey)) => Some(hotkey.to_string()),
        Ok(None) => Some("none".to_string()),
        Err(e) => {
            errors.push(ConfigError::new(field, e.to_string()));
            None
        }
    }
}

impl Settings {
    /// Build settings from a parsed `settings.json` value, field by field
    pub fn from_json(value: &Value) -> LoadedSettings {
        let mut errors = Vec::new();
        let mut settings = Settings::default();

        let Some(map) = value.as_object() else {
            errors.push(ConfigError::new(WHOLE_FILE, "expected a JSON object"));
            return LoadedSettings { settings, errors };
        };

        if let Some(v) = decode_field(map, "run_at_startup", None, &mut errors) {
            settings.run_at_startup = v;
        }
        if let Some(v) = decode_field(map, "show_notifications", None, &mut errors) {
            settings.show_notifications = v;
        }
        if let Some(v) = decode_field::<String>(map, "open_hotkey", Some("swap_hotkey"), &mut errors)
            .and_then(|v| validate_hotkey(v, "open_hotkey", &mut errors))
        {
            settings.open_hotkey = v;
        }
        if let Some(v) = decode_field::<String>(map, "cycle_hotkey", None, &mut errors)
            .and_then(|v| validate_hotkey(v, "cycle_hotkey", &mut errors))
        {
            settings.cycle_hotkey = v;
        }
        if let Some(v) = decode_field::<usize>(map, "stack_size", Some("max_stack_size"), &mut errors) {
            if v >= 1 {
                settings.stack_size = v;
            } else {
                errors.push(ConfigError::new("stack_size", "must be at least 1"));
            }
        }
        if let Some(v) = decode_field(map, "dark_mode", None, &mut errors) {
            settings.dark_mode = v;
        }
        if let Some(v) = decode_field::<u64>(map, "poll_interval_ms", None, &mut errors) {
            settings.poll_interval_ms = v.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        }
        if let Some(v) = decode_field(map, "paste_delay_ms", None, &mut errors) {
            settings.paste_delay_ms = v;
        }
        if let Some(v) = decode_field::<String>(map, "log_level", None, &mut errors) {
            let lower = v.to_lowercase();
            if LOG_LEVELS.contains(&lower.as_str()) {
                settings.log_level = lower;
            } else {
                errors.push(ConfigError::new("log_level", format!("unknown level `{}`", v)));
            }
        }

        for error in &errors {
            log::warn!("Settings: {}, using default", error);
        }

        LoadedSettings { settings, errors }
    }

    /// Parsed hotkey bindings; unparseable strings count as disabled
    pub fn bindings(&self) -> HotkeyBindings {
        HotkeyBindings {
            open: Hotkey::parse(&self.open_hotkey).ok().flatten(),
            cycle: Hotkey::parse(&self.cycle_hotkey).ok().flatten(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn paste_delay(&self) -> Duration {
        Duration::from_millis(self.paste_delay_ms)
    }
}

/// Trait for settings storage
pub trait SettingsStorage: Send + Sync {
    /// Load settings. A missing file yields defaults; malformed fields fall
    /// back individually and are reported in `LoadedSettings::errors`.
    fn load(&self) -> Result<LoadedSettings, PersistenceError>;

    /// Write settings to storage
    fn save(&self, settings: &Settings) -> Result<(), PersistenceError>;

    /// Get the settings file path
    fn path(&self) -> &Path;
}

/// JSON-based implementation of SettingsStorage
pub struct JsonSettingsStorage {
    path: PathBuf,
}

impl JsonSettingsStorage {
    pub fn new(path: PathBuf) -> Self {
        JsonSettingsStorage { path }
    }

    /// Storage at the standard file name inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SETTINGS_FILE))
    }
}

impl SettingsStorage for JsonSettingsStorage {
    fn load(&self) -> Result<LoadedSettings, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("Settings file not found at {:?}, using defaults", self.path);
                return Ok(LoadedSettings::default());
            }
            Err(source) => {
                let error = PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                };
                return Ok(LoadedSettings::unusable(error.to_string()));
            }
        };

        // from_slice also rejects invalid UTF-8
        let loaded = match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Settings::from_json(&value),
            Err(e) => LoadedSettings::unusable(e.to_string()),
        };

        log::info!("Loaded settings from {:?}", self.path);
        log::debug!(
            "Settings: stack_size={}, open_hotkey={}, cycle_hotkey={}",
            loaded.settings.stack_size,
            loaded.settings.open_hotkey,
            loaded.settings.cycle_hotkey
        );

        Ok(loaded)
    }

    fn save(&self, settings: &Settings) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(settings).map_err(|source| {
            PersistenceError::Encode {
                what: "settings",
                source,
            }
        })?;

        let write_err = |source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        // Write to .tmp, then rename, so a watcher never sees a partial file
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        log::debug!("Saved settings to {:?}", self.path);

        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.stack_size, 20);
        assert_eq!(settings.open_hotkey, "ctrl+q");
        assert!(settings.show_notifications);
        assert!(!settings.run_at_startup);
    }

    #[test]
    fn test_malformed_field_falls_back_alone() {
        let loaded = Settings::from_json(&json!({
            "run_at_startup": "yes please",
            "show_notifications": false,
            "stack_size": 5,
        }));

        assert!(!loaded.settings.run_at_startup);
        assert!(!loaded.settings.show_notifications);
        assert_eq!(loaded.settings.stack_size, 5);
        assert_eq!(loaded.errors.len(), 1);
        assert_eq!(loaded.errors[0].field, "run_at_startup");
    }

    #[test]
    fn test_stack_size_must_be_positive() {
        let loaded = Settings::from_json(&json!({ "stack_size": 0 }));
        assert_eq!(loaded.settings.stack_size, 20);
        assert_eq!(loaded.errors[0].field, "stack_size");

        let negative = Settings::from_json(&json!({ "stack_size": -3 }));
        assert_eq!(negative.settings.stack_size, 20);
        assert_eq!(negative.errors.len(), 1);
    }

    #[test]
    fn test_hotkeys_are_validated_and_normalized() {
        let loaded = Settings::from_json(&json!({
            "open_hotkey": "Ctrl + G",
            "cycle_hotkey": "ctrl+nonsense",
        }));
        assert_eq!(loaded.settings.open_hotkey, "ctrl+g");
        assert_eq!(loaded.settings.cycle_hotkey, "ctrl+q");
        assert_eq!(loaded.errors.len(), 1);
        assert_eq!(loaded.errors[0].field, "cycle_hotkey");
    }

    #[test]
    fn test_legacy_keys() {
        let loaded = Settings::from_json(&json!({
            "swap_hotkey": "alt+v",
            "max_stack_size": 1000,
            "type_hotkey": "",
        }));
        assert_eq!(loaded.settings.open_hotkey, "alt+v");
        assert_eq!(loaded.settings.stack_size, 1000);
        assert!(loaded.errors.is_empty());
    }

    #[test]
    fn test_disabled_hotkey() {
        let loaded = Settings::from_json(&json!({ "open_hotkey": "None" }));
        assert_eq!(loaded.settings.open_hotkey, "none");
        assert_eq!(loaded.settings.bindings().open, None);
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let loaded = Settings::from_json(&json!({ "poll_interval_ms": 1 }));
        assert_eq!(loaded.settings.poll_interval_ms, MIN_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_storage_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = JsonSettingsStorage::in_dir(dir.path()).load().unwrap();
        assert_eq!(loaded.settings, Settings::default());
        assert!(loaded.errors.is_empty());
    }

    #[test]
    fn test_storage_invalid_json_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let storage = JsonSettingsStorage::in_dir(dir.path());
        fs::write(storage.path(), "stack_size = 3").unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.settings, Settings::default());
        assert_eq!(loaded.errors.len(), 1);
        assert!(loaded.is_unusable());
    }

    #[test]
    fn test_storage_invalid_utf8_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let storage = JsonSettingsStorage::in_dir(dir.path());
        fs::write(storage.path(), b"{\"open_hotkey\": \"ctrl+\xff\"}").unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.settings, Settings::default());
        assert!(loaded.is_unusable());
    }

    #[test]
    fn test_storage_unreadable_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let storage = JsonSettingsStorage::in_dir(dir.path());
        fs::create_dir(storage.path()).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.settings, Settings::default());
        assert!(loaded.is_unusable());
    }

    #[test]
    fn test_bad_field_is_not_whole_file_failure() {
        let loaded = Settings::from_json(&json!({ "stack_size": "many" }));
        assert!(!loaded.errors.is_empty());
        assert!(!loaded.is_unusable());
        assert!(Settings::from_json(&json!([1, 2])).is_unusable());
    }

    #[test]
    fn test_storage_save_then_load() {
        let dir = TempDir::new().unwrap();
        let storage = JsonSettingsStorage::in_dir(dir.path());
        let settings = Settings {
            stack_size: 7,
            dark_mode: true,
            open_hotkey: "alt+shift+v".to_string(),
            ..Settings::default()
        };

        storage.save(&settings).unwrap();
        assert!(!dir.path().join("settings.json.tmp").exists());
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.settings, settings);
        assert!(loaded.errors.is_empty());
    }
}
