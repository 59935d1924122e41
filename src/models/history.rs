use chrono::{DateTime, Utc};

use super::clip::ClipboardEntry;
use super::search;

/// Default number of entries kept
pub const DEFAULT_CAPACITY: usize = 20;

/// Bounded clipboard history, most recent first
///
/// The store is purely in-memory; callers persist after every mutation that
/// reports a change. Capacity is always at least 1.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<ClipboardEntry>,
    capacity: usize,
    /// Newest timestamp handed out or loaded; the floor for the next append
    latest: Option<DateTime<Utc>>,
}

impl HistoryStore {
    /// Create an empty store
    pub fn new(capacity: usize) -> Self {
        HistoryStore {
            entries: Vec::new(),
            capacity: capacity.max(1),
            latest: None,
        }
    }

    /// Create a store from previously persisted entries (most recent first),
    /// dropping the tail beyond `capacity`
    pub fn from_entries(mut entries: Vec<ClipboardEntry>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        if entries.len() > capacity {
            log::info!(
                "Loaded history has {} entries, truncating to {}",
                entries.len(),
                capacity
            );
            entries.truncate(capacity);
        }
        let latest = entries.iter().map(|e| e.timestamp).max();
        HistoryStore {
            entries,
            capacity,
            latest,
        }
    }

    /// Insert `content` at the head unless it equals the current head.
    /// Evicts the oldest entry when over capacity.
    /// Returns true if the store changed.
    pub fn append(&mut self, content: impl Into<String>) -> bool {
        self.append_at(content, Utc::now())
    }

    /// `append` with the wall clock reading `now`
    pub fn append_at(&mut self, content: impl Into<String>, now: DateTime<Utc>) -> bool {
        let content = content.into();

        if let Some(head) = self.entries.first() {
            if head.content == content {
                log::debug!("Clipboard content matches head, skipping");
                return false;
            }
        }

        // Timestamps never go backwards across appends, even if the wall
        // clock does or a promoted older entry is at the head
        let timestamp = match self.latest {
            Some(latest) if now < latest => latest,
            _ => now,
        };
        self.latest = Some(timestamp);

        self.entries.insert(0, ClipboardEntry::new(content, timestamp));
        self.enforce_capacity();
        true
    }

    /// Move the entry at `index` to the head, keeping the relative order of
    /// the rest. Returns true if the order changed.
    pub fn promote(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.entries.len() {
            return false;
        }
        let entry = self.entries.remove(index);
        self.entries.insert(0, entry);
        true
    }

    /// Change the capacity (clamped to at least 1), dropping tail entries
    /// that no longer fit. Returns the number of evicted entries.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity.max(1);
        let before = self.entries.len();
        self.enforce_capacity();
        before - self.entries.len()
    }

    /// Immutable copy of the current ordering
    pub fn snapshot(&self) -> Vec<ClipboardEntry> {
        self.entries.clone()
    }

    /// Entries containing `query` (case-insensitive), in history order
    pub fn search(&self, query: &str) -> Vec<ClipboardEntry> {
        search::filter_entries(&self.entries, query)
    }

    /// Index of the entry identical to `entry` (same content and timestamp)
    pub fn position(&self, entry: &ClipboardEntry) -> Option<usize> {
        self.entries.iter().position(|e| e == entry)
    }

    pub fn get(&self, index: usize) -> Option<&ClipboardEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn enforce_capacity(&mut self) {
        if self.entries.len() > self.capacity {
            let evicted = self.entries.len() - self.capacity;
            self.entries.truncate(self.capacity);
            log::debug!("Evicted {} oldest entries", evicted);
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
