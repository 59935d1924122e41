use super::state::CycleState;
use crate::models::{ClipboardEntry, HistoryStore};

/// Input to the selector state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEvent {
    /// The open hotkey was pressed. `modifier_held` is false when the binding
    /// has no modifier or the key source cannot report its release.
    Open { modifier_held: bool },
    /// The cycle key was pressed
    Cycle,
    /// The held modifier was released
    ModifierReleased,
    Enter,
    Escape,
    Up,
    Down,
    /// The overlay search text changed
    Query(String),
}

/// Outcome of feeding one event to the selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed
    Ignored,
    /// The overlay opened over a fresh snapshot
    Opened,
    /// The cursor moved
    Moved,
    /// The visible list was narrowed or widened
    Filtered,
    /// The overlay closed with this entry selected; the caller promotes and pastes it
    Committed(ClipboardEntry),
    /// The overlay closed without a selection
    Cancelled,
}

/// `Idle` or cycling over a snapshot
#[derive(Debug, Default)]
pub struct CycleSelector {
    state: Option<CycleState>,
}

impl CycleSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cycle, if the overlay is open
    pub fn state(&self) -> Option<&CycleState> {
        self.state.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Apply one event. `history` is only read when the overlay opens.
    pub fn handle(&mut self, event: SelectorEvent, history: &HistoryStore) -> Transition {
        let Some(state) = self.state.as_mut() else {
            return match event {
                SelectorEvent::Open { modifier_held } => {
                    let snapshot = history.snapshot();
                    log::debug!(
                        "Overlay opened over {} entries (modifier held: {})",
                        snapshot.len(),
                        modifier_held
                    );
                    self.state = Some(CycleState::new(snapshot, modifier_held));
                    Transition::Opened
                }
                _ => Transition::Ignored,
            };
        };

        match event {
            // A repeated open press keeps cycling rather than reopening
            SelectorEvent::Open { .. } | SelectorEvent::Cycle => {
                if state.advance() {
                    Transition::Moved
                } else {
                    Transition::Ignored
                }
            }
            SelectorEvent::Up => {
                if state.move_up() {
                    Transition::Moved
                } else {
                    Transition::Ignored
                }
            }
            SelectorEvent::Down => {
                if state.move_down() {
                    Transition::Moved
                } else {
                    Transition::Ignored
                }
            }
            SelectorEvent::Query(query) => {
                if state.set_query(&query) {
                    Transition::Filtered
                } else {
                    Transition::Ignored
                }
            }
            SelectorEvent::ModifierReleased => {
                if !state.is_active() {
                    return Transition::Ignored;
                }
                state.release_modifier();
                self.finish()
            }
            SelectorEvent::Enter => {
                if state.is_empty() {
                    Transition::Ignored
                } else {
                    self.finish()
                }
            }
            SelectorEvent::Escape => {
                self.state = None;
                log::debug!("Overlay cancelled");
                Transition::Cancelled
            }
        }
    }

    /// Close the overlay, committing the entry under the cursor if any
    fn finish(&mut self) -> Transition {
        match self.state.take().and_then(|s| s.current().cloned()) {
            Some(entry) => {
                log::debug!("Committing entry from {}", entry.timestamp);
                Transition::Committed(entry)
            }
            None => {
                log::debug!("Overlay closed with nothing selected");
                Transition::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: SelectorEvent = SelectorEvent::Open {
        modifier_held: true,
    };

    fn store_of(newest_first: &[&str]) -> HistoryStore {
        let mut store = HistoryStore::new(20);
        for text in newest_first.iter().rev() {
            store.append(*text);
        }
        store
    }

    fn current(selector: &CycleSelector) -> &str {
        &selector.state().unwrap().current().unwrap().content
    }

    #[test]
    fn test_cycle_scenario() {
        let store = store_of(&["x", "y", "z"]);
        let mut selector = CycleSelector::new();

        assert_eq!(selector.handle(OPEN, &store), Transition::Opened);
        assert_eq!(current(&selector), "x");

        selector.handle(SelectorEvent::Cycle, &store);
        assert_eq!(current(&selector), "y");
        selector.handle(SelectorEvent::Cycle, &store);
        assert_eq!(current(&selector), "z");
        selector.handle(SelectorEvent::Cycle, &store);
        assert_eq!(current(&selector), "x");

        match selector.handle(SelectorEvent::ModifierReleased, &store) {
            Transition::Committed(entry) => assert_eq!(entry.content, "x"),
            other => panic!("expected commit, got {:?}", other),
        }
        assert!(!selector.is_open());
    }

    #[test]
    fn test_k_presses_return_to_start() {
        let store = store_of(&["a", "b", "c", "d", "e"]);
        let mut selector = CycleSelector::new();
        selector.handle(OPEN, &store);
        selector.handle(SelectorEvent::Down, &store);
        let start = selector.state().unwrap().cursor();

        for _ in 0..store.len() {
            selector.handle(SelectorEvent::Cycle, &store);
        }
        assert_eq!(selector.state().unwrap().cursor(), start);
    }

    #[test]
    fn test_reopen_while_open_cycles() {
        let store = store_of(&["x", "y"]);
        let mut selector = CycleSelector::new();
        selector.handle(OPEN, &store);
        assert_eq!(selector.handle(OPEN, &store), Transition::Moved);
        assert_eq!(current(&selector), "y");
    }

    #[test]
    fn test_empty_history_release_cancels() {
        let store = HistoryStore::new(5);
        let mut selector = CycleSelector::new();

        assert_eq!(selector.handle(OPEN, &store), Transition::Opened);
        assert!(selector.state().unwrap().is_empty());
        assert_eq!(selector.handle(SelectorEvent::Cycle, &store), Transition::Ignored);
        assert_eq!(
            selector.handle(SelectorEvent::ModifierReleased, &store),
            Transition::Cancelled
        );
        assert!(!selector.is_open());
    }

    #[test]
    fn test_escape_cancels() {
        let store = store_of(&["x", "y"]);
        let mut selector = CycleSelector::new();
        selector.handle(OPEN, &store);
        selector.handle(SelectorEvent::Cycle, &store);
        assert_eq!(selector.handle(SelectorEvent::Escape, &store), Transition::Cancelled);
        assert_eq!(
            selector.handle(SelectorEvent::ModifierReleased, &store),
            Transition::Ignored
        );
    }

    #[test]
    fn test_idle_ignores_everything_but_open() {
        let store = store_of(&["x"]);
        let mut selector = CycleSelector::new();
        for event in [
            SelectorEvent::Cycle,
            SelectorEvent::ModifierReleased,
            SelectorEvent::Enter,
            SelectorEvent::Escape,
            SelectorEvent::Down,
            SelectorEvent::Query("x".to_string()),
        ] {
            assert_eq!(selector.handle(event, &store), Transition::Ignored);
        }
        assert!(!selector.is_open());
    }

    #[test]
    fn test_snapshot_ignores_later_appends() {
        let mut store = store_of(&["x", "y"]);
        let mut selector = CycleSelector::new();
        selector.handle(OPEN, &store);

        store.append("new");
        selector.handle(SelectorEvent::Cycle, &store);
        assert_eq!(current(&selector), "y");
        assert_eq!(selector.state().unwrap().snapshot().len(), 2);

        selector.handle(SelectorEvent::Escape, &store);
        selector.handle(OPEN, &store);
        assert_eq!(current(&selector), "new");
    }

    #[test]
    fn test_enter_commits_without_modifier() {
        let store = store_of(&["x", "y", "z"]);
        let mut selector = CycleSelector::new();
        selector.handle(
            SelectorEvent::Open {
                modifier_held: false,
            },
            &store,
        );
        selector.handle(SelectorEvent::Down, &store);
        selector.handle(SelectorEvent::Down, &store);

        // No modifier to release: stays open
        assert_eq!(
            selector.handle(SelectorEvent::ModifierReleased, &store),
            Transition::Ignored
        );
        match selector.handle(SelectorEvent::Enter, &store) {
            Transition::Committed(entry) => assert_eq!(entry.content, "z"),
            other => panic!("expected commit, got {:?}", other),
        }
    }

    #[test]
    fn test_commit_uses_filtered_list() {
        let store = store_of(&["foobar", "baz", "food"]);
        let mut selector = CycleSelector::new();
        selector.handle(OPEN, &store);
        selector.handle(SelectorEvent::Cycle, &store);

        assert_eq!(
            selector.handle(SelectorEvent::Query("foo".to_string()), &store),
            Transition::Filtered
        );
        assert_eq!(current(&selector), "foobar");
        selector.handle(SelectorEvent::Cycle, &store);

        match selector.handle(SelectorEvent::Enter, &store) {
            Transition::Committed(entry) => assert_eq!(entry.content, "food"),
            other => panic!("expected commit, got {:?}", other),
        }
    }

    #[test]
    fn test_enter_on_empty_filter_is_ignored() {
        let store = store_of(&["alpha"]);
        let mut selector = CycleSelector::new();
        selector.handle(OPEN, &store);
        selector.handle(SelectorEvent::Query("zzz".to_string()), &store);

        assert_eq!(selector.handle(SelectorEvent::Enter, &store), Transition::Ignored);
        assert!(selector.is_open());
        assert_eq!(
            selector.handle(SelectorEvent::ModifierReleased, &store),
            Transition::Cancelled
        );
    }
}
