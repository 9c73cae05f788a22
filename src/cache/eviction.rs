//! Eviction Module
//!
//! Selects least-recently-accessed entries for removal when a bounded
//! partition runs out of room.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Select Evictees ==
/// Returns the keys of the `count` least-recently-accessed entries.
///
/// Candidates are ordered by ascending `last_accessed_at`; ties are broken by
/// key order so the selection is stable across repeated runs.
pub fn select_evictees(entries: &HashMap<String, CacheEntry>, count: usize) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(&String, u64)> = entries
        .iter()
        .map(|(key, entry)| (key, entry.last_accessed_at))
        .collect();
    candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    candidates
        .into_iter()
        .take(count)
        .map(|(key, _)| key.clone())
        .collect()
}
