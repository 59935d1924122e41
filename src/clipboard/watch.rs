use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::backend::{ClipboardAccess, ClipboardBackend};
use super::{ChangeCallback, ClipboardSource};

struct Poller {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Clipboard source that polls the clipboard on a background thread
///
/// Content present when polling starts is not reported; only later changes
/// are. Consecutive reads of the same text are reported once.
pub struct PollingClipboard {
    backend: ClipboardBackend,
    interval: Duration,
    poller: Option<Poller>,
}

impl PollingClipboard {
    pub fn new(backend: ClipboardBackend, interval: Duration) -> Self {
        PollingClipboard {
            backend,
            interval,
            poller: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_some()
    }
}

impl ClipboardSource for PollingClipboard {
    fn start(&mut self, on_change: ChangeCallback) -> Result<()> {
        if self.poller.is_some() {
            return Ok(());
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let backend = self.backend;
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name("smartclip-clipboard".to_string())
            .spawn(move || {
                let mut access = ClipboardAccess::new(backend);
                poll_loop(|| access.read_text(), interval, &thread_stop, on_change);
            })
            .context("Failed to spawn clipboard polling thread")?;

        log::info!(
            "Clipboard watcher started ({}, every {:?})",
            self.backend.name(),
            self.interval
        );
        self.poller = Some(Poller { stop, handle });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop.store(true, Ordering::SeqCst);
            poller.handle.thread().unpark();
            if poller.handle.join().is_err() {
                log::error!("Clipboard polling thread panicked");
            }
            log::info!("Clipboard watcher stopped");
        }
    }

    fn name(&self) -> &'static str {
        self.backend.name()
    }
}

impl Drop for PollingClipboard {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poll `read` every `interval` until `stop` is set, reporting each new text
fn poll_loop<R>(mut read: R, interval: Duration, stop: &AtomicBool, on_change: ChangeCallback)
where
    R: FnMut() -> Option<String>,
{
    let mut last = read();

    while !stop.load(Ordering::SeqCst) {
        thread::park_timeout(interval);
        if stop.load(Ordering::SeqCst) {
            break;
        }

        let current = read();
        if current != last {
            if let Some(text) = &current {
                on_change(text.clone());
            }
            last = current;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[test]
    fn test_poll_loop_reports_changes_only() {
        let script: VecDeque<Option<&str>> = VecDeque::from(vec![
            Some("primed"),
            Some("primed"),
            Some("b"),
            Some("b"),
            None,
            Some("b"),
        ]);
        let script = Mutex::new(script);
        let stop = Arc::new(AtomicBool::new(false));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let reader_stop = stop.clone();
        let read = || {
            let mut script = script.lock().unwrap();
            let next = script.pop_front().flatten().map(str::to_string);
            if script.is_empty() {
                reader_stop.store(true, Ordering::SeqCst);
            }
            next
        };

        let sink = seen.clone();
        poll_loop(
            read,
            Duration::from_millis(1),
            &stop,
            Box::new(move |text| sink.lock().unwrap().push(text)),
        );

        assert_eq!(*seen.lock().unwrap(), vec!["b".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut source = PollingClipboard::new(ClipboardBackend::Arboard, Duration::from_millis(50));
        source.stop();
        assert!(!source.is_running());
        assert_eq!(source.name(), "arboard");
    }
}
