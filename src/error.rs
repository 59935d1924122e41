use std::path::PathBuf;

/// Failure to read or write one of the persisted files.
///
/// Always recovered locally: loads fall back to defaults, saves are retried
/// with the next mutation.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("persistence worker is no longer running")]
    WorkerStopped,
}

/// Failure to deliver content to the focused application.
#[derive(Debug, thiserror::Error)]
pub enum PasteError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("failed to launch `{tool}`: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool}` exited with {status}")]
    ToolFailed { tool: &'static str, status: String },

    #[error("no paste method available on this platform")]
    Unsupported,
}

/// A hotkey string that does not name a key combination
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyError {
    #[error("unknown key `{0}`")]
    UnknownKey(String),

    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
}

/// A single settings field that could not be used; the field falls back to
/// its default and the rest of the file still loads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for `{field}`: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError {
            field,
            reason: reason.into(),
        }
    }
}
