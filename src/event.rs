use ratatui::crossterm::event::KeyEvent;

use crate::hotkey::HotkeyEvent;

/// Everything the main loop reacts to
///
/// Producers (the clipboard poller, the key reader, the settings watcher)
/// run on their own threads and send these over one channel, so the app
/// state is only ever touched from the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// New text was copied
    ClipboardChanged(String),
    /// A registered hotkey was pressed or released
    Hotkey(HotkeyEvent),
    /// A key aimed at the overlay
    Overlay(OverlayKey),
    /// settings.json changed on disk
    SettingsChanged,
    /// Terminal was resized; redraw
    Resize,
    /// Quit requested
    Shutdown,
}

/// Overlay keys that are not hotkeys
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayKey {
    Enter,
    Escape,
    Up,
    Down,
    /// Anything else, passed to the search box
    Edit(KeyEvent),
}
