pub mod backend;
pub mod paste;
pub mod watch;

use anyhow::Result;
use std::time::Duration;

use crate::error::PasteError;

pub use backend::{ClipboardAccess, ClipboardBackend};
pub use paste::{KeystrokeTool, SystemPaste};
pub use watch::PollingClipboard;

/// Receives each new clipboard text, on the source's own thread
pub type ChangeCallback = Box<dyn Fn(String) + Send>;

/// Something that reports clipboard text changes
pub trait ClipboardSource {
    /// Begin reporting changes through `on_change`. Starting a running
    /// source is a no-op.
    fn start(&mut self, on_change: ChangeCallback) -> Result<()>;

    /// Stop reporting; no callback runs after this returns
    fn stop(&mut self);

    /// Get the source name (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// Delivers content to the focused application
pub trait PasteInjector {
    /// Make `content` the clipboard content and trigger a paste into the
    /// window that had focus before the overlay
    fn inject_paste(&self, content: &str) -> Result<(), PasteError>;

    /// Change the wait between focus release and the paste keystroke
    fn set_delay(&mut self, _delay: Duration) {}
}

/// Clipboard source for the current display server
pub fn create_source(poll_interval: Duration) -> Box<dyn ClipboardSource> {
    Box::new(PollingClipboard::new(ClipboardBackend::detect(), poll_interval))
}

/// Paste injector for the current display server
pub fn create_paste_injector(paste_delay: Duration) -> Box<dyn PasteInjector> {
    Box::new(SystemPaste::detect(ClipboardBackend::detect(), paste_delay))
}
