use crate::models::{ClipboardEntry, matching_indices};

/// Whether the cursor has moved since the overlay opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Open,
    Cycling,
}

/// Cursor over a frozen copy of the history
///
/// `visible` holds the snapshot positions that pass the current query, in
/// snapshot order; `cursor` indexes into `visible`.
#[derive(Debug, Clone)]
pub struct CycleState {
    snapshot: Vec<ClipboardEntry>,
    visible: Vec<usize>,
    cursor: usize,
    query: String,
    active: bool,
    phase: Phase,
}

impl CycleState {
    /// Start a cycle over `snapshot`. `active` is true while the triggering
    /// modifier is held.
    pub fn new(snapshot: Vec<ClipboardEntry>, active: bool) -> Self {
        let visible = (0..snapshot.len()).collect();
        CycleState {
            snapshot,
            visible,
            cursor: 0,
            query: String::new(),
            active,
            phase: Phase::Open,
        }
    }

    /// Advance the cursor, wrapping past the end. No-op on an empty list.
    pub(crate) fn advance(&mut self) -> bool {
        if self.visible.is_empty() {
            return false;
        }
        self.cursor = (self.cursor + 1) % self.visible.len();
        self.phase = Phase::Cycling;
        true
    }

    /// Move the cursor one row up, stopping at the top
    pub(crate) fn move_up(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.phase = Phase::Cycling;
        true
    }

    /// Move the cursor one row down, stopping at the bottom
    pub(crate) fn move_down(&mut self) -> bool {
        if self.cursor + 1 >= self.visible.len() {
            return false;
        }
        self.cursor += 1;
        self.phase = Phase::Cycling;
        true
    }

    /// Narrow the visible list. The cursor goes back to the top.
    pub(crate) fn set_query(&mut self, query: &str) -> bool {
        if self.query == query {
            return false;
        }
        self.query = query.to_string();
        self.visible = matching_indices(&self.snapshot, &self.query);
        self.cursor = 0;
        true
    }

    pub(crate) fn release_modifier(&mut self) {
        self.active = false;
    }

    /// Entry under the cursor
    pub fn current(&self) -> Option<&ClipboardEntry> {
        self.visible.get(self.cursor).map(|&i| &self.snapshot[i])
    }

    /// Entries currently shown, in order
    pub fn visible(&self) -> impl Iterator<Item = &ClipboardEntry> {
        self.visible.iter().map(|&i| &self.snapshot[i])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn snapshot(&self) -> &[ClipboardEntry] {
        &self.snapshot
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_of(texts: &[&str]) -> CycleState {
        let snapshot = texts.iter().map(|t| ClipboardEntry::now(*t)).collect();
        CycleState::new(snapshot, true)
    }

    #[test]
    fn test_advance_wraps() {
        let mut state = state_of(&["x", "y", "z"]);
        let mut seen = Vec::new();
        for _ in 0..4 {
            state.advance();
            seen.push(state.cursor());
        }
        assert_eq!(seen, vec![1, 2, 0, 1]);
        assert_eq!(state.phase(), Phase::Cycling);
    }

    #[test]
    fn test_arrows_clamp() {
        let mut state = state_of(&["x", "y"]);
        assert!(!state.move_up());
        assert!(state.move_down());
        assert!(!state.move_down());
        assert_eq!(state.current().unwrap().content, "y");
    }

    #[test]
    fn test_empty_state_is_inert() {
        let mut state = state_of(&[]);
        assert!(!state.advance());
        assert!(!state.move_down());
        assert!(state.current().is_none());
        assert_eq!(state.phase(), Phase::Open);
    }

    #[test]
    fn test_query_resets_cursor() {
        let mut state = state_of(&["foobar", "baz", "food"]);
        state.advance();
        state.advance();
        assert!(state.set_query("FOO"));
        assert_eq!(state.cursor(), 0);

        let shown: Vec<&str> = state.visible().map(|e| e.content.as_str()).collect();
        assert_eq!(shown, vec!["foobar", "food"]);
        assert_eq!(state.snapshot().len(), 3);

        assert!(!state.set_query("FOO"));
    }
}
