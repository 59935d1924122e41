use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::mpsc::Sender;

use crate::clipboard::ClipboardSource;
use crate::event::Event;
use crate::hotkey::{HotkeyBindings, HotkeyEvent, HotkeyRegistrar};
use crate::models::ClipboardEntry;
use crate::storage::SETTINGS_FILE;

/// Background collaborators feeding the event channel
///
/// Owns the clipboard source, the hotkey registrar and the settings file
/// watcher. All of them are released by `stop`, which also runs on drop.
pub struct Service {
    source: Box<dyn ClipboardSource>,
    registrar: Box<dyn HotkeyRegistrar>,
    events: Sender<Event>,
    /// Kept alive to maintain the watch
    settings_watcher: Option<RecommendedWatcher>,
    running: bool,
}

impl Service {
    pub fn new(
        source: Box<dyn ClipboardSource>,
        registrar: Box<dyn HotkeyRegistrar>,
        events: Sender<Event>,
    ) -> Self {
        Service {
            source,
            registrar,
            events,
            settings_watcher: None,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the registrar reports modifier releases
    pub fn reports_releases(&self) -> bool {
        self.registrar.reports_releases()
    }

    /// Start monitoring the clipboard and listening for hotkeys
    ///
    /// When `settings_dir` is given, changes to settings.json there are
    /// reported as `Event::SettingsChanged`.
    pub fn start(&mut self, bindings: &HotkeyBindings, settings_dir: Option<&Path>) -> Result<()> {
        if self.running {
            return Ok(());
        }

        let tx = self.events.clone();
        self.source
            .start(Box::new(move |text: String| {
                if ClipboardEntry::is_recordable(&text) {
                    let _ = tx.send(Event::ClipboardChanged(text));
                }
            }))
            .with_context(|| format!("Failed to start clipboard source {}", self.source.name()))?;

        if let Err(e) = self.register(bindings) {
            self.source.stop();
            return Err(e);
        }

        if let Some(dir) = settings_dir {
            self.settings_watcher = watch_settings(dir, self.events.clone());
        }

        self.running = true;
        log::info!("Service started ({})", self.source.name());
        Ok(())
    }

    fn register(&mut self, bindings: &HotkeyBindings) -> Result<()> {
        let tx = self.events.clone();
        self.registrar
            .register(
                bindings,
                Box::new(move |hotkey: HotkeyEvent| {
                    let _ = tx.send(Event::Hotkey(hotkey));
                }),
            )
            .context("Failed to register hotkeys")
    }

    /// Replace the registered hotkeys
    pub fn rebind(&mut self, bindings: &HotkeyBindings) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        self.registrar.unregister();
        self.register(bindings)
    }

    /// Stop everything; idempotent
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.settings_watcher = None;
        self.registrar.unregister();
        self.source.stop();
        self.running = false;
        log::info!("Service stopped");
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Watch the directory rather than the file so atomic saves by editors
/// (write temp, rename) are seen
fn watch_settings(dir: &Path, tx: Sender<Event>) -> Option<RecommendedWatcher> {
    let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
        Ok(event) => {
            let touches_settings = event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(OsStr::new(SETTINGS_FILE)));
            if touches_settings && (event.kind.is_modify() || event.kind.is_create()) {
                let _ = tx.send(Event::SettingsChanged);
            }
        }
        Err(e) => log::warn!("Settings watcher error: {}", e),
    });

    match watcher {
        Ok(mut w) => match w.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                log::info!("Watching settings in {:?}", dir);
                Some(w)
            }
            Err(e) => {
                log::warn!("Failed to watch settings directory {:?}: {}", dir, e);
                None
            }
        },
        Err(e) => {
            log::warn!("Failed to create settings watcher: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ChangeCallback;
    use crate::hotkey::{Hotkey, HotkeyCallback, KeyId};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Probe {
        on_change: Option<ChangeCallback>,
        on_hotkey: Option<HotkeyCallback>,
        log: Vec<&'static str>,
    }

    type SharedProbe = Arc<Mutex<Probe>>;

    struct FakeSource(SharedProbe);

    impl ClipboardSource for FakeSource {
        fn start(&mut self, on_change: ChangeCallback) -> Result<()> {
            let mut probe = self.0.lock().unwrap();
            probe.on_change = Some(on_change);
            probe.log.push("source.start");
            Ok(())
        }

        fn stop(&mut self) {
            let mut probe = self.0.lock().unwrap();
            probe.on_change = None;
            probe.log.push("source.stop");
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    struct FakeRegistrar(SharedProbe);

    impl HotkeyRegistrar for FakeRegistrar {
        fn register(&mut self, _bindings: &HotkeyBindings, on_event: HotkeyCallback) -> Result<()> {
            let mut probe = self.0.lock().unwrap();
            probe.on_hotkey = Some(on_event);
            probe.log.push("register");
            Ok(())
        }

        fn unregister(&mut self) {
            let mut probe = self.0.lock().unwrap();
            probe.on_hotkey = None;
            probe.log.push("unregister");
        }

        fn reports_releases(&self) -> bool {
            true
        }
    }

    fn service() -> (Service, SharedProbe, mpsc::Receiver<Event>) {
        let probe = SharedProbe::default();
        let (tx, rx) = mpsc::channel();
        let service = Service::new(
            Box::new(FakeSource(probe.clone())),
            Box::new(FakeRegistrar(probe.clone())),
            tx,
        );
        (service, probe, rx)
    }

    fn bindings() -> HotkeyBindings {
        HotkeyBindings {
            open: Hotkey::parse("ctrl+q").unwrap(),
            cycle: Hotkey::parse("ctrl+q").unwrap(),
        }
    }

    #[test]
    fn test_events_flow_into_channel() {
        let (mut service, probe, rx) = service();
        service.start(&bindings(), None).unwrap();

        {
            let probe = probe.lock().unwrap();
            (probe.on_change.as_ref().unwrap())("copied".to_string());
            (probe.on_change.as_ref().unwrap())("   ".to_string());
            (probe.on_hotkey.as_ref().unwrap())(HotkeyEvent::pressed(KeyId::Open));
        }

        assert_eq!(rx.try_recv().unwrap(), Event::ClipboardChanged("copied".to_string()));
        assert_eq!(
            rx.try_recv().unwrap(),
            Event::Hotkey(HotkeyEvent::pressed(KeyId::Open))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_start_stop_are_idempotent() {
        let (mut service, probe, _rx) = service();
        service.start(&bindings(), None).unwrap();
        service.start(&bindings(), None).unwrap();
        service.stop();
        service.stop();
        drop(service);

        assert_eq!(
            probe.lock().unwrap().log,
            vec!["source.start", "register", "unregister", "source.stop"]
        );
    }

    #[test]
    fn test_rebind_reregisters() {
        let (mut service, probe, _rx) = service();
        service.rebind(&bindings()).unwrap();
        assert!(probe.lock().unwrap().log.is_empty());

        service.start(&bindings(), None).unwrap();
        service.rebind(&bindings()).unwrap();
        assert_eq!(
            probe.lock().unwrap().log,
            vec!["source.start", "register", "unregister", "register"]
        );
    }
}
