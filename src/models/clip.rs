use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

/// Display format used for entry timestamps in the overlay
const DISPLAY_TIME_FORMAT: &str = "%d %b  %I:%M:%S %p";

/// A single clipboard entry
///
/// Identity is the pair (content, timestamp): two entries with the same text
/// copied at different times are different entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    /// Text payload
    pub content: String,
    /// When the entry was recorded (serialized as ISO-8601)
    pub timestamp: DateTime<Utc>,
}

impl ClipboardEntry {
    /// Create an entry with an explicit timestamp
    pub fn new(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        ClipboardEntry {
            content: content.into(),
            timestamp,
        }
    }

    /// Create an entry stamped with the current time
    pub fn now(content: impl Into<String>) -> Self {
        Self::new(content, Utc::now())
    }

    /// Whether captured clipboard text is worth recording. Blank text is not.
    pub fn is_recordable(text: &str) -> bool {
        !text.trim().is_empty()
    }

    /// Single-line preview, whitespace collapsed, truncated to `max_width` columns
    pub fn preview(&self, max_width: usize) -> String {
        let collapsed = self.content.split_whitespace().collect::<Vec<_>>().join(" ");
        truncate_to_width(&collapsed, max_width)
    }

    /// Local-time rendering of the timestamp for display
    pub fn display_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format(DISPLAY_TIME_FORMAT)
            .to_string()
    }

    /// Case-insensitive substring match; `query_lower` must already be lowercase
    pub fn matches_lowercase(&self, query_lower: &str) -> bool {
        self.content.to_lowercase().contains(query_lower)
    }
}

/// Truncate `text` so it occupies at most `max_width` terminal columns,
/// appending "..." when anything was cut
fn truncate_to_width(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}
