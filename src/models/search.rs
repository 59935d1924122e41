use super::clip::ClipboardEntry;

/// Positions of the entries whose content contains `query`, ignoring case,
/// in their original order. An empty query matches everything.
pub fn matching_indices(entries: &[ClipboardEntry], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..entries.len()).collect();
    }

    let query_lower = query.to_lowercase();
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.matches_lowercase(&query_lower))
        .map(|(i, _)| i)
        .collect()
}

/// Ordered subsequence of `entries` matching `query`
pub fn filter_entries(entries: &[ClipboardEntry], query: &str) -> Vec<ClipboardEntry> {
    matching_indices(entries, query)
        .into_iter()
        .map(|i| entries[i].clone())
        .collect()
}
