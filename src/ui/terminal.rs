//! Terminal session setup and the terminal-backed hotkey source
//!
//! In the terminal frontend the overlay's own window receives the keys, so
//! "global" hotkeys are read from the terminal. Terminals that speak the
//! kitty keyboard protocol report bare modifier releases, which lets a
//! held-modifier cycle commit on release the way a desktop switcher does.
//! Other terminals fall back to committing with Enter.

use anyhow::{Context, Result};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{
    self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, ModifierKeyCode, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::event::{Event, OverlayKey};
use crate::hotkey::{
    Hotkey, HotkeyBindings, HotkeyCallback, HotkeyEvent, HotkeyRegistrar, Key, KeyId, ModifierKey,
};

/// How long the reader blocks before re-checking its stop flag
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Raw mode plus alternate screen, restored on drop
pub struct TerminalSession {
    keyboard_enhancement: bool,
}

impl TerminalSession {
    /// Enter raw mode and the alternate screen, enabling key release
    /// reporting when the terminal supports it
    pub fn enter() -> Result<(Self, Terminal<CrosstermBackend<Stdout>>)> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

        let keyboard_enhancement = matches!(supports_keyboard_enhancement(), Ok(true))
            && execute!(
                stdout,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                )
            )
            .is_ok();
        log::debug!("Keyboard enhancement: {}", keyboard_enhancement);

        let session = TerminalSession {
            keyboard_enhancement,
        };
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .context("Failed to create terminal")?;
        Ok((session, terminal))
    }

    /// Whether modifier releases will be reported
    pub fn reports_releases(&self) -> bool {
        self.keyboard_enhancement
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        restore_terminal(self.keyboard_enhancement);
    }
}

fn restore_terminal(keyboard_enhancement: bool) {
    let mut stdout = io::stdout();
    if keyboard_enhancement {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    let _ = disable_raw_mode();
    let _ = execute!(stdout, LeaveAlternateScreen, ratatui::crossterm::cursor::Show);
    let _ = stdout.flush();
}

/// Restore the terminal before the panic message is printed
pub fn install_panic_hook() {
    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal(true);
        prev(info);
    }));
}

/// What a terminal key event means to the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Hotkey(HotkeyEvent),
    Overlay(OverlayKey),
    Quit,
    Ignore,
}

fn modifier_of(code: ModifierKeyCode) -> Option<ModifierKey> {
    match code {
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => Some(ModifierKey::Ctrl),
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => Some(ModifierKey::Alt),
        ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => Some(ModifierKey::Shift),
        ModifierKeyCode::LeftSuper
        | ModifierKeyCode::RightSuper
        | ModifierKeyCode::LeftMeta
        | ModifierKeyCode::RightMeta
        | ModifierKeyCode::LeftHyper
        | ModifierKeyCode::RightHyper => Some(ModifierKey::Super),
        _ => None,
    }
}

fn event_modifiers(modifiers: KeyModifiers) -> Vec<ModifierKey> {
    let mut held = Vec::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        held.push(ModifierKey::Ctrl);
    }
    if modifiers.contains(KeyModifiers::ALT) {
        held.push(ModifierKey::Alt);
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        held.push(ModifierKey::Shift);
    }
    if modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META) {
        held.push(ModifierKey::Super);
    }
    held
}

/// Whether `key` is the combination `hotkey`
pub fn matches_hotkey(hotkey: &Hotkey, key: &KeyEvent) -> bool {
    let code_matches = match (hotkey.key(), key.code) {
        (Key::Char(c), KeyCode::Char(k)) => k.to_ascii_lowercase() == c,
        (Key::F(n), KeyCode::F(k)) => n == k,
        (Key::Space, KeyCode::Char(' ')) => true,
        (Key::Tab, KeyCode::Tab) => true,
        (Key::Tab, KeyCode::BackTab) => hotkey.has_modifier(ModifierKey::Shift),
        _ => false,
    };
    if !code_matches {
        return false;
    }

    let held = event_modifiers(key.modifiers);
    held.len() == hotkey.modifiers().len() && held.iter().all(|m| hotkey.has_modifier(*m))
}

/// Map a terminal key event to an app action
pub fn classify(key: &KeyEvent, bindings: Option<&HotkeyBindings>) -> KeyAction {
    if let KeyCode::Modifier(code) = key.code {
        let held = bindings.and_then(HotkeyBindings::modifier);
        return match (modifier_of(code), key.kind) {
            (Some(m), KeyEventKind::Release) if Some(m) == held => {
                KeyAction::Hotkey(HotkeyEvent::released(KeyId::Modifier))
            }
            (Some(m), KeyEventKind::Press) if Some(m) == held => {
                KeyAction::Hotkey(HotkeyEvent::pressed(KeyId::Modifier))
            }
            _ => KeyAction::Ignore,
        };
    }

    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }

    if let Some(bindings) = bindings {
        if bindings.open.as_ref().is_some_and(|h| matches_hotkey(h, key)) {
            return KeyAction::Hotkey(HotkeyEvent::pressed(KeyId::Open));
        }
        if bindings.cycle.as_ref().is_some_and(|h| matches_hotkey(h, key)) {
            return KeyAction::Hotkey(HotkeyEvent::pressed(KeyId::Cycle));
        }
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    match key.code {
        KeyCode::Enter => KeyAction::Overlay(OverlayKey::Enter),
        KeyCode::Esc => KeyAction::Overlay(OverlayKey::Escape),
        KeyCode::Up => KeyAction::Overlay(OverlayKey::Up),
        KeyCode::Down => KeyAction::Overlay(OverlayKey::Down),
        _ => KeyAction::Overlay(OverlayKey::Edit(*key)),
    }
}

struct Registration {
    bindings: HotkeyBindings,
    on_event: HotkeyCallback,
}

type SharedRegistration = Arc<Mutex<Option<Registration>>>;

/// Hotkey source reading keys from the terminal
///
/// A reader thread classifies every key: registered hotkeys go to the
/// registered callback, other keys go to the main event channel as overlay
/// input.
pub struct TerminalKeys {
    events: Sender<Event>,
    registration: SharedRegistration,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    releases: bool,
}

impl TerminalKeys {
    pub fn new(events: Sender<Event>, releases: bool) -> Self {
        TerminalKeys {
            events,
            registration: Arc::new(Mutex::new(None)),
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
            releases,
        }
    }

    /// Start the reader thread
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        self.stop.store(false, Ordering::SeqCst);

        let events = self.events.clone();
        let registration = self.registration.clone();
        let stop = self.stop.clone();
        let handle = std::thread::Builder::new()
            .name("smartclip-input".to_string())
            .spawn(move || read_loop(&events, &registration, &stop))
            .context("Failed to spawn terminal input thread")?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Stop the reader thread
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Terminal input thread panicked");
            }
        }
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        self.stop();
    }
}

impl HotkeyRegistrar for TerminalKeys {
    fn register(&mut self, bindings: &HotkeyBindings, on_event: HotkeyCallback) -> Result<()> {
        let mut slot = self
            .registration
            .lock()
            .map_err(|_| anyhow::anyhow!("Hotkey registration lock poisoned"))?;
        *slot = Some(Registration {
            bindings: bindings.clone(),
            on_event,
        });
        drop(slot);

        log::info!(
            "Registered hotkeys: open={}, cycle={}",
            describe(bindings.open.as_ref()),
            describe(bindings.cycle.as_ref())
        );
        self.start()
    }

    fn unregister(&mut self) {
        if let Ok(mut slot) = self.registration.lock() {
            *slot = None;
        }
        // Stop reading so no key is consumed after the session ends
        self.stop();
        log::debug!("Hotkeys unregistered");
    }

    fn reports_releases(&self) -> bool {
        self.releases
    }
}

fn describe(hotkey: Option<&Hotkey>) -> String {
    hotkey.map_or_else(|| "none".to_string(), Hotkey::to_string)
}

fn read_loop(events: &Sender<Event>, registration: &SharedRegistration, stop: &AtomicBool) {
    log::debug!("Terminal input thread started");

    while !stop.load(Ordering::SeqCst) {
        match event::poll(INPUT_POLL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                log::error!("Terminal input failed: {}", e);
                let _ = events.send(Event::Shutdown);
                break;
            }
        }

        let delivered = match event::read() {
            Ok(TermEvent::Key(key)) => dispatch(&key, registration, events),
            Ok(TermEvent::Resize(..)) => events.send(Event::Resize).is_ok(),
            Ok(_) => true,
            Err(e) => {
                log::error!("Terminal input failed: {}", e);
                let _ = events.send(Event::Shutdown);
                false
            }
        };

        // Main loop is gone
        if !delivered {
            break;
        }
    }

    log::debug!("Terminal input thread exiting");
}

fn dispatch(key: &KeyEvent, registration: &SharedRegistration, events: &Sender<Event>) -> bool {
    let Ok(slot) = registration.lock() else {
        return false;
    };

    match classify(key, slot.as_ref().map(|r| &r.bindings)) {
        KeyAction::Hotkey(hotkey) => {
            if let Some(registration) = slot.as_ref() {
                (registration.on_event)(hotkey);
            }
            true
        }
        KeyAction::Overlay(overlay) => events.send(Event::Overlay(overlay)).is_ok(),
        KeyAction::Quit => events.send(Event::Shutdown).is_ok(),
        KeyAction::Ignore => true,
    }
}
