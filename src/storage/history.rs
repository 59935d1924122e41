use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::models::ClipboardEntry;

/// File name of the persisted history inside the data directory
pub const HISTORY_FILE: &str = "clipboard_history.json";

/// Trait for clipboard history persistence
pub trait HistoryStorage: Send + Sync {
    /// Load entries, most recent first. A missing, unreadable or corrupt file
    /// yields an empty list.
    fn load(&self) -> Result<Vec<ClipboardEntry>, PersistenceError>;

    /// Replace the stored history with `entries`
    fn save(&self, entries: &[ClipboardEntry]) -> Result<(), PersistenceError>;

    /// Get the storage file path
    fn path(&self) -> &Path;
}

/// JSON array of `{ "content", "timestamp" }` objects
/// Uses atomic write pattern with .tmp file for safety
pub struct JsonHistoryStorage {
    path: PathBuf,
}

impl JsonHistoryStorage {
    pub fn new(path: PathBuf) -> Self {
        JsonHistoryStorage { path }
    }

    /// Storage at the standard file name inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(HISTORY_FILE))
    }

    fn backup_corrupted(&self, reason: &str) {
        let backup_path = self.path.with_extension("json.corrupted");
        log::warn!(
            "History file corrupted, backing up to {:?}: {}",
            backup_path,
            reason
        );

        if let Err(backup_err) = fs::rename(&self.path, &backup_path) {
            log::error!("Failed to backup corrupted file: {}", backup_err);
        }
    }
}

/// Accepted shapes of a stored item, including ones written by older versions.
/// The timestamp may be anything; only an RFC 3339 string is used.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredItem {
    Current {
        content: String,
        #[serde(default)]
        timestamp: Value,
    },
    Legacy {
        text: String,
        #[serde(default)]
        timestamp: Value,
    },
    Plain(String),
}

impl StoredItem {
    fn into_parts(self) -> (String, Option<DateTime<Utc>>) {
        let (content, timestamp) = match self {
            StoredItem::Current { content, timestamp } => (content, timestamp),
            StoredItem::Legacy { text, timestamp } => (text, timestamp),
            StoredItem::Plain(text) => (text, Value::Null),
        };
        let parsed = timestamp.as_str().and_then(|ts| {
            DateTime::parse_from_rfc3339(ts)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        });
        (content, parsed)
    }
}

/// Decode stored items, skipping unusable ones and keeping timestamps
/// non-increasing down the list
fn decode_items(items: Vec<Value>) -> Vec<ClipboardEntry> {
    let load_time = Utc::now();
    let mut entries: Vec<ClipboardEntry> = Vec::with_capacity(items.len());

    for (i, value) in items.into_iter().enumerate() {
        let item = match serde_json::from_value::<StoredItem>(value) {
            Ok(item) => item,
            Err(e) => {
                log::warn!("Skipping unreadable history item {}: {}", i, e);
                continue;
            }
        };

        let (content, parsed) = item.into_parts();
        if content.is_empty() {
            continue;
        }

        let newer = entries.last().map(|e| e.timestamp);
        let mut timestamp = parsed.or(newer).unwrap_or(load_time);
        if let Some(newer) = newer {
            timestamp = timestamp.min(newer);
        }

        entries.push(ClipboardEntry::new(content, timestamp));
    }

    entries
}

impl HistoryStorage for JsonHistoryStorage {
    fn load(&self) -> Result<Vec<ClipboardEntry>, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("History file not found at {:?}, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(source) => {
                let error = PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                };
                log::error!("{}, starting empty", error);
                self.backup_corrupted(&error.to_string());
                return Ok(Vec::new());
            }
        };

        let contents = match String::from_utf8(bytes) {
            Ok(contents) => contents,
            Err(e) => {
                self.backup_corrupted(&e.to_string());
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(items)) => {
                let entries = decode_items(items);
                log::info!("Loaded {} clips from {:?}", entries.len(), self.path);
                Ok(entries)
            }
            Ok(_) => {
                self.backup_corrupted("top-level value is not an array");
                Ok(Vec::new())
            }
            Err(e) => {
                self.backup_corrupted(&e.to_string());
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, entries: &[ClipboardEntry]) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(entries).map_err(|source| {
            PersistenceError::Encode {
                what: "clipboard history",
                source,
            }
        })?;

        let write_err = |source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        // Atomic write pattern: write to .tmp, then rename
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        log::debug!("Saved {} clips to {:?}", entries.len(), self.path);

        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> JsonHistoryStorage {
        JsonHistoryStorage::in_dir(dir.path())
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(storage_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let t = Utc.with_ymd_and_hms(2025, 11, 26, 22, 6, 20).unwrap();
        let entries = vec![
            ClipboardEntry::new("INTERVAL '1 month - 1 day'", t),
            ClipboardEntry::new("2012-07-10", t - chrono::Duration::minutes(3)),
        ];

        storage.save(&entries).unwrap();
        assert_eq!(storage.load().unwrap(), entries);
        assert!(!dir.path().join("clipboard_history.json.tmp").exists());
    }

    #[test]
    fn test_file_format() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let t = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        storage.save(&[ClipboardEntry::new("a", t)]).unwrap();

        let raw = fs::read_to_string(storage.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "content": "a", "timestamp": "2025-01-02T03:04:05Z" }])
        );
    }

    #[test]
    fn test_corrupt_file_is_backed_up() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "{ not json").unwrap();

        assert!(storage.load().unwrap().is_empty());
        assert!(dir.path().join("clipboard_history.json.corrupted").exists());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_invalid_utf8_is_backed_up() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), b"[{\"content\": \"a\xff\xfe\"}]").unwrap();

        assert!(storage.load().unwrap().is_empty());
        assert!(dir.path().join("clipboard_history.json.corrupted").exists());
    }

    #[test]
    fn test_unreadable_path_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        // A directory where the file should be cannot be read as one
        fs::create_dir(storage.path()).unwrap();

        assert!(storage.load().unwrap().is_empty());
        assert!(dir.path().join("clipboard_history.json.corrupted").exists());
    }

    #[test]
    fn test_non_string_timestamp_keeps_item() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let raw = r#"[
            {"content": "newer", "timestamp": "2021-06-01T12:00:00Z"},
            {"content": "numeric", "timestamp": 1622548800},
            {"text": "legacy", "timestamp": null}
        ]"#;
        fs::write(storage.path(), raw).unwrap();

        let entries = storage.load().unwrap();
        let texts: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(texts, vec!["newer", "numeric", "legacy"]);
        assert_eq!(entries[1].timestamp, entries[0].timestamp);
        assert_eq!(entries[2].timestamp, entries[0].timestamp);
    }

    #[test]
    fn test_non_array_is_treated_as_corrupt() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), r#"{"content": "a"}"#).unwrap();
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_legacy_items_are_accepted() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let raw = r#"[
            {"text": "redeem.nvidia.com", "timestamp": "26 Nov  11:57:44 PM"},
            "plain string item",
            {"content": "current", "timestamp": "2020-01-01T00:00:00Z"},
            42,
            {"content": ""}
        ]"#;
        fs::write(storage.path(), raw).unwrap();

        let entries = storage.load().unwrap();
        let texts: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(texts, vec!["redeem.nvidia.com", "plain string item", "current"]);

        for pair in entries.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        assert_eq!(
            entries[2].timestamp,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
