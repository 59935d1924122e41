use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use super::history::HistoryStorage;
use crate::error::PersistenceError;
use crate::models::ClipboardEntry;

/// Called on the worker thread when a save fails
pub type ErrorCallback = Box<dyn Fn(&PersistenceError) + Send>;

enum Job {
    Save(Vec<ClipboardEntry>),
    Flush(Sender<()>),
}

/// Background writer for the history file
///
/// `save` never blocks: the latest state is queued and written on the worker
/// thread. Queued states are coalesced so only the newest one hits the disk.
/// A failed write is reported through the callback; the next save rewrites
/// the whole file, which retries it.
pub struct PersistWorker {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl PersistWorker {
    /// Spawn the worker thread
    pub fn spawn(storage: Arc<dyn HistoryStorage>, on_error: ErrorCallback) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();

        let handle = std::thread::Builder::new()
            .name("smartclip-persist".to_string())
            .spawn(move || run_worker(storage, rx, on_error));

        match handle {
            Ok(handle) => PersistWorker {
                tx: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                log::error!("Failed to start persistence thread: {}", e);
                PersistWorker {
                    tx: None,
                    handle: None,
                }
            }
        }
    }

    /// Queue `entries` to be written. Fire-and-forget.
    pub fn save(&self, entries: Vec<ClipboardEntry>) -> Result<(), PersistenceError> {
        let tx = self.tx.as_ref().ok_or(PersistenceError::WorkerStopped)?;
        tx.send(Job::Save(entries))
            .map_err(|_| PersistenceError::WorkerStopped)
    }

    /// Block until everything queued so far has been written (or failed)
    pub fn flush(&self) -> Result<(), PersistenceError> {
        let tx = self.tx.as_ref().ok_or(PersistenceError::WorkerStopped)?;
        let (done_tx, done_rx) = mpsc::channel();
        tx.send(Job::Flush(done_tx))
            .map_err(|_| PersistenceError::WorkerStopped)?;
        done_rx.recv().map_err(|_| PersistenceError::WorkerStopped)
    }
}

impl Drop for PersistWorker {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain its queue and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Persistence thread panicked");
            }
        }
    }
}

fn run_worker(storage: Arc<dyn HistoryStorage>, rx: Receiver<Job>, on_error: ErrorCallback) {
    log::debug!("Persistence thread started");

    while let Ok(job) = rx.recv() {
        let mut pending = None;
        let mut waiters = Vec::new();

        let mut absorb = |job: Job| match job {
            Job::Save(entries) => pending = Some(entries),
            Job::Flush(done) => waiters.push(done),
        };
        absorb(job);
        while let Ok(next) = rx.try_recv() {
            absorb(next);
        }

        if let Some(entries) = pending {
            if let Err(e) = storage.save(&entries) {
                log::error!("Failed to save clipboard history: {}", e);
                on_error(&e);
            }
        }

        for done in waiters {
            let _ = done.send(());
        }
    }

    log::debug!("Persistence thread exiting");
}
