use std::env;
use std::process::{Command, Stdio};

use crate::error::PasteError;

/// How the system clipboard is read and written
///
/// On Wayland sessions with wl-clipboard installed the `wl-paste`/`wl-copy`
/// tools are used; everywhere else arboard talks to the clipboard directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardBackend {
    WlClipboard,
    Arboard,
}

impl ClipboardBackend {
    /// Pick a backend for the current display server
    pub fn detect() -> Self {
        let wayland = env::var("WAYLAND_DISPLAY").is_ok()
            || env::var("XDG_SESSION_TYPE").is_ok_and(|v| v == "wayland");

        if wayland && Command::new("wl-paste").arg("--version").output().is_ok() {
            log::info!("Detected Wayland display server, using wl-clipboard");
            ClipboardBackend::WlClipboard
        } else {
            log::info!("Using arboard clipboard backend");
            ClipboardBackend::Arboard
        }
    }

    /// Get the backend name (for logging/debugging)
    pub fn name(self) -> &'static str {
        match self {
            ClipboardBackend::WlClipboard => "wl-clipboard",
            ClipboardBackend::Arboard => "arboard",
        }
    }
}

/// Read/write access to the clipboard through one backend
///
/// The arboard handle is opened lazily and kept: on X11 the written text is
/// only served while the handle lives.
pub struct ClipboardAccess {
    backend: ClipboardBackend,
    arboard: Option<arboard::Clipboard>,
}

impl ClipboardAccess {
    pub fn new(backend: ClipboardBackend) -> Self {
        ClipboardAccess {
            backend,
            arboard: None,
        }
    }

    pub fn backend(&self) -> ClipboardBackend {
        self.backend
    }

    fn arboard(&mut self) -> Result<&mut arboard::Clipboard, PasteError> {
        if self.arboard.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| PasteError::Clipboard(e.to_string()))?;
            self.arboard = Some(clipboard);
        }
        self.arboard
            .as_mut()
            .ok_or_else(|| PasteError::Clipboard("clipboard handle missing".to_string()))
    }

    /// Current text content, or `None` when the clipboard is empty, holds
    /// non-text data, or cannot be read
    pub fn read_text(&mut self) -> Option<String> {
        match self.backend {
            ClipboardBackend::WlClipboard => Command::new("wl-paste")
                .arg("--no-newline")
                .arg("--type")
                .arg("text")
                .stdin(Stdio::null())
                .stderr(Stdio::null())
                .output()
                .ok()
                .filter(|output| output.status.success())
                .and_then(|output| String::from_utf8(output.stdout).ok()),
            ClipboardBackend::Arboard => match self.arboard() {
                Ok(clipboard) => clipboard.get_text().ok(),
                Err(e) => {
                    log::debug!("Clipboard read failed: {}", e);
                    None
                }
            },
        }
    }

    /// Replace the clipboard content with `text`
    pub fn write_text(&mut self, text: &str) -> Result<(), PasteError> {
        match self.backend {
            ClipboardBackend::WlClipboard => {
                let status = Command::new("wl-copy")
                    .arg("--type")
                    .arg("text/plain")
                    .arg("--")
                    .arg(text)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .map_err(|source| PasteError::Spawn {
                        tool: "wl-copy",
                        source,
                    })?;

                if !status.success() {
                    return Err(PasteError::ToolFailed {
                        tool: "wl-copy",
                        status: status.to_string(),
                    });
                }
            }
            ClipboardBackend::Arboard => {
                self.arboard()?
                    .set_text(text.to_string())
                    .map_err(|e| PasteError::Clipboard(e.to_string()))?;
            }
        }

        log::debug!("Wrote {} bytes text to clipboard", text.len());
        Ok(())
    }
}
