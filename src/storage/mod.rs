pub mod history;
pub mod settings;
pub mod writer;

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs;
use std::path::PathBuf;

pub use history::{HISTORY_FILE, HistoryStorage, JsonHistoryStorage};
pub use settings::{JsonSettingsStorage, LoadedSettings, SETTINGS_FILE, Settings, SettingsStorage};
pub use writer::PersistWorker;

/// Directory name under the per-OS config directory
const APP_DIR_NAME: &str = "SmartClip";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "SMARTCLIP_DATA_DIR";

/// Resolve the data directory without creating it
///
/// - Windows: %APPDATA%\SmartClip
/// - Linux: $XDG_CONFIG_HOME/SmartClip (default: ~/.config/SmartClip)
/// - macOS: ~/Library/Application Support/SmartClip
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let base = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(base.join(APP_DIR_NAME))
}

/// Ensure the data directory exists and return it
pub fn ensure_data_dir() -> Result<PathBuf> {
    let dir = data_dir()?;

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {:?}", dir))?;

    log::debug!("Data directory: {:?}", dir);

    Ok(dir)
}
