pub mod clip;
pub mod history;
pub mod search;

pub use clip::ClipboardEntry;
pub use history::{DEFAULT_CAPACITY, HistoryStore};
pub use search::{filter_entries, matching_indices};
