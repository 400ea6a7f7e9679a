//! Title search over the entry list.

use crate::models::DiaryEntry;

/// Keep entries whose title contains `term`, ignoring case.
///
/// An empty term keeps everything. The relative order of `entries` is
/// preserved and the input is not modified.
#[must_use]
pub fn filter_entries<'a>(entries: &'a [DiaryEntry], term: &str) -> Vec<&'a DiaryEntry> {
    if term.is_empty() {
        return entries.iter().collect();
    }
    let needle = term.to_lowercase();
    entries
        .iter()
        .filter(|entry| title_matches(entry, &needle))
        .collect()
}

fn title_matches(entry: &DiaryEntry, needle: &str) -> bool {
    entry.title.to_lowercase().contains(needle)
}
