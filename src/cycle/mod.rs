//! Alt-tab style selection over a snapshot of the clipboard history
//!
//! The selector is driven by [`SelectorEvent`]s and reports what happened as a
//! [`Transition`]. It never touches the store beyond taking a snapshot when the
//! overlay opens; committing is left to the caller.

pub mod selector;
pub mod state;

pub use selector::{CycleSelector, SelectorEvent, Transition};
pub use state::{CycleState, Phase};
