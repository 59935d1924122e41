use anyhow::{Context, Result};
use ratatui::backend::Backend;
use ratatui::crossterm::event::{Event as TermEvent, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{Frame, Terminal};
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::clipboard::PasteInjector;
use crate::cycle::{CycleSelector, SelectorEvent, Transition};
use crate::event::{Event, OverlayKey};
use crate::hotkey::{HotkeyEvent, KeyId};
use crate::logging::Notification;
use crate::models::{ClipboardEntry, HistoryStore};
use crate::service::Service;
use crate::storage::{PersistWorker, Settings, SettingsStorage};
use crate::ui::{self, Theme, ViewContext};

/// How long the loop waits for an event before redrawing
const TICK: Duration = Duration::from_millis(250);

/// Main application state
///
/// Every event is handled here, one at a time, so the store and the
/// selector need no locking.
pub struct App {
    /// Clipboard history, most recent first
    pub history: HistoryStore,

    /// Overlay state machine
    pub selector: CycleSelector,

    /// Effective settings
    pub settings: Settings,

    /// Overlay search text with cursor support
    pub search_input: Input,

    /// Notifications shown in the status line
    pub notifications: Vec<Notification>,

    /// Flag to request application exit
    pub should_quit: bool,

    /// Content to paste after the terminal is restored (exit-on-close mode)
    pub paste_request: Option<String>,

    theme: Theme,

    /// Background history writer
    persist: PersistWorker,

    settings_storage: Box<dyn SettingsStorage>,

    paste: Box<dyn PasteInjector>,

    /// Receiver for notifications from the logger
    notify_rx: Option<Receiver<Notification>>,

    /// Clipboard source, hotkeys and settings watcher
    service: Option<Service>,

    /// Whether the hotkey source reports modifier releases
    reports_releases: bool,

    /// Quit once the overlay closes
    exit_on_close: bool,
}

impl App {
    pub fn new(
        history: HistoryStore,
        settings: Settings,
        persist: PersistWorker,
        settings_storage: Box<dyn SettingsStorage>,
        paste: Box<dyn PasteInjector>,
        notify_rx: Option<Receiver<Notification>>,
    ) -> Self {
        let theme = Theme::for_mode(settings.dark_mode);

        App {
            history,
            selector: CycleSelector::new(),
            settings,
            search_input: Input::default(),
            notifications: Vec::new(),
            should_quit: false,
            paste_request: None,
            theme,
            persist,
            settings_storage,
            paste,
            notify_rx,
            service: None,
            reports_releases: false,
            exit_on_close: false,
        }
    }

    /// Attach the background collaborators
    pub fn with_service(mut self, service: Service) -> Self {
        self.reports_releases = service.reports_releases();
        self.service = Some(service);
        self
    }

    /// Quit after the first commit or cancel, pasting once the terminal is gone
    pub fn exit_on_close(mut self, enabled: bool) -> Self {
        self.exit_on_close = enabled;
        self
    }

    /// Start the service, watching settings in `settings_dir`
    pub fn start(&mut self, settings_dir: Option<&Path>) -> Result<()> {
        let bindings = self.settings.bindings();
        if bindings.open.is_none() {
            log::warn!("Open hotkey is disabled; the overlay can only be opened from the command line");
        }
        if let Some(service) = self.service.as_mut() {
            service.start(&bindings, settings_dir)?;
        }
        Ok(())
    }

    /// Open the overlay without a hotkey press
    pub fn open_overlay(&mut self) {
        self.apply(SelectorEvent::Open {
            modifier_held: false,
        });
    }

    /// Run the event loop until quit, then stop the service and flush history
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>, events: &Receiver<Event>) -> Result<()> {
        while !self.should_quit {
            self.poll_notifications();
            self.prune_notifications();

            terminal.draw(|frame| self.draw(frame))?;

            match events.recv_timeout(TICK) {
                Ok(event) => {
                    self.dispatch(event);
                    // Drain whatever queued up while drawing
                    while !self.should_quit {
                        match events.try_recv() {
                            Ok(event) => self.dispatch(event),
                            Err(_) => break,
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("Event channel closed, shutting down");
                    self.should_quit = true;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    fn dispatch(&mut self, event: Event) {
        if let Err(e) = self.handle_event(event) {
            log::error!("{:#}", e);
        }
    }

    /// Handle one event
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::ClipboardChanged(text) => self.record_clipboard(text),
            Event::Hotkey(hotkey) => self.handle_hotkey(hotkey),
            Event::Overlay(key) => self.handle_overlay_key(key),
            Event::SettingsChanged => return self.reload_settings(),
            Event::Resize => {}
            Event::Shutdown => self.should_quit = true,
        }
        Ok(())
    }

    /// Append captured text to the history; the open overlay keeps its snapshot
    fn record_clipboard(&mut self, text: String) {
        if !ClipboardEntry::is_recordable(&text) {
            return;
        }
        if self.history.append(text) {
            log::debug!("Recorded clip, {} in history", self.history.len());
            self.persist_history();
        }
    }

    fn handle_hotkey(&mut self, hotkey: HotkeyEvent) {
        let event = match (hotkey.key, hotkey.pressed) {
            (KeyId::Open, true) => SelectorEvent::Open {
                modifier_held: self.reports_releases && self.settings.bindings().modifier().is_some(),
            },
            (KeyId::Cycle, true) => SelectorEvent::Cycle,
            (KeyId::Modifier, false) => SelectorEvent::ModifierReleased,
            _ => return,
        };
        self.apply(event);
    }

    fn handle_overlay_key(&mut self, key: OverlayKey) {
        if !self.selector.is_open() {
            if let OverlayKey::Edit(key) = key {
                self.handle_idle_key(key);
            }
            return;
        }

        let event = match key {
            OverlayKey::Enter => SelectorEvent::Enter,
            OverlayKey::Escape => SelectorEvent::Escape,
            OverlayKey::Up => SelectorEvent::Up,
            OverlayKey::Down => SelectorEvent::Down,
            OverlayKey::Edit(key) => {
                // Editing keys go to tui-input; only a changed value refilters
                if self.search_input.handle_event(&TermEvent::Key(key)).is_none() {
                    return;
                }
                SelectorEvent::Query(self.search_input.value().to_string())
            }
        };
        self.apply(event);
    }

    fn handle_idle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::NONE {
            self.should_quit = true;
        }
    }

    /// Feed the selector and act on the outcome
    fn apply(&mut self, event: SelectorEvent) {
        match self.selector.handle(event, &self.history) {
            Transition::Committed(entry) => {
                self.search_input.reset();
                self.commit(entry);
                if self.exit_on_close {
                    self.should_quit = true;
                }
            }
            Transition::Cancelled => {
                self.search_input.reset();
                if self.exit_on_close {
                    self.should_quit = true;
                }
            }
            Transition::Opened => self.search_input.reset(),
            Transition::Ignored | Transition::Moved | Transition::Filtered => {}
        }
    }

    /// Promote the chosen entry and paste it
    fn commit(&mut self, entry: ClipboardEntry) {
        let changed = match self.history.position(&entry) {
            Some(index) => self.history.promote(index),
            None => {
                log::info!("Selected clip was evicted while the overlay was open, re-adding it");
                self.history.append(entry.content.clone())
            }
        };
        if changed {
            self.persist_history();
        }

        if self.exit_on_close {
            self.paste_request = Some(entry.content);
        } else {
            self.deliver_paste(&entry.content);
        }
    }

    fn deliver_paste(&self, content: &str) {
        if let Err(e) = self.paste.inject_paste(content) {
            log::error!("Paste failed: {}", e);
        }
    }

    /// Paste content deferred by exit-on-close mode
    pub fn deliver_pending_paste(&mut self) {
        if let Some(content) = self.paste_request.take() {
            self.deliver_paste(&content);
        }
    }

    /// Queue the current history for writing
    fn persist_history(&self) {
        if let Err(e) = self.persist.save(self.history.snapshot()) {
            log::warn!("Could not queue history save: {}", e);
        }
    }

    /// Re-read settings.json and apply what changed
    pub fn reload_settings(&mut self) -> Result<()> {
        let loaded = self
            .settings_storage
            .load()
            .context("Failed to reload settings")?;
        if loaded.is_unusable() {
            // Unreadable or mid-write; applying defaults could shrink the history
            log::warn!("Settings file could not be used, keeping current settings");
            return Ok(());
        }
        for error in &loaded.errors {
            log::warn!("Settings: {}", error);
        }
        self.apply_settings(loaded.settings)
    }

    /// Switch to `settings`, resizing the history and rebinding hotkeys as needed
    pub fn apply_settings(&mut self, settings: Settings) -> Result<()> {
        if settings == self.settings {
            return Ok(());
        }
        log::info!("Applying updated settings");

        if settings.stack_size != self.history.capacity() {
            let evicted = self.history.set_capacity(settings.stack_size);
            log::info!(
                "History capacity set to {} ({} evicted)",
                settings.stack_size,
                evicted
            );
            if evicted > 0 {
                self.persist_history();
            }
        }

        if settings.paste_delay_ms != self.settings.paste_delay_ms {
            self.paste.set_delay(settings.paste_delay());
        }
        if settings.dark_mode != self.settings.dark_mode {
            self.theme = Theme::for_mode(settings.dark_mode);
        }
        if settings.poll_interval_ms != self.settings.poll_interval_ms {
            log::info!("New clipboard poll interval takes effect on restart");
        }

        let rebind = settings.bindings() != self.settings.bindings();
        self.settings = settings;

        if rebind {
            if let Some(service) = self.service.as_mut() {
                service.rebind(&self.settings.bindings())?;
            }
        }
        Ok(())
    }

    /// Poll notification receiver and add to queue
    pub fn poll_notifications(&mut self) {
        if let Some(rx) = &self.notify_rx {
            while let Ok(notification) = rx.try_recv() {
                if self.settings.show_notifications {
                    self.notifications.push(notification);
                }
            }
        }
    }

    /// Remove expired notifications
    pub fn prune_notifications(&mut self) {
        if self.notifications.is_empty() {
            return;
        }
        let now = Instant::now();
        self.notifications.retain(|n| !n.is_expired(now));
    }

    /// Stop the service and write the final history synchronously
    pub fn shutdown(&mut self) {
        if let Some(service) = self.service.as_mut() {
            service.stop();
        }
        self.persist_history();
        if let Err(e) = self.persist.flush() {
            log::error!("Failed to flush history on shutdown: {}", e);
        }
        log::info!("Shut down with {} clips", self.history.len());
    }

    /// Render the TUI
    pub fn draw(&self, frame: &mut Frame) {
        let open_key = self.settings.bindings().open.map(|h| h.to_string());
        ui::render(
            frame,
            &ViewContext {
                history: &self.history,
                cycle: self.selector.state(),
                search_input: &self.search_input,
                notifications: &self.notifications,
                open_key,
                theme: &self.theme,
            },
        );
    }
}
