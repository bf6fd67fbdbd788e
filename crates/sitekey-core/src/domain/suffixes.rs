//! Multi-level effective TLD table.
//!
//! The table is embedded at compile time via `include_str!` and parsed once
//! on first access using `OnceLock`.

use std::collections::HashSet;
use std::sync::OnceLock;

const MULTI_LEVEL_RAW: &str = include_str!("suffixes/multi_level.txt");

/// Parsed table: the entries in file order, a lookup set, and the label
/// count of the longest entry.
struct SuffixTable {
    entries: Box<[&'static str]>,
    lookup: HashSet<&'static str>,
    max_labels: usize,
}

static TABLE_LOCK: OnceLock<SuffixTable> = OnceLock::new();

fn table() -> &'static SuffixTable {
    TABLE_LOCK.get_or_init(|| {
        let entries: Vec<&'static str> = MULTI_LEVEL_RAW
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("//"))
            .collect();
        let lookup = entries.iter().copied().collect();
        let max_labels = entries
            .iter()
            .map(|entry| entry.split('.').count())
            .max()
            .unwrap_or(2);
        SuffixTable {
            entries: entries.into_boxed_slice(),
            lookup,
            max_labels,
        }
    })
}

/// Returns every multi-level suffix in the embedded table.
#[must_use]
pub fn multi_level_suffixes() -> &'static [&'static str] {
    &table().entries
}

/// Returns `true` if `suffix` is a known multi-level effective TLD.
#[must_use]
pub fn is_multi_level_suffix(suffix: &str) -> bool {
    table().lookup.contains(suffix)
}

/// Label count of the longest entry in the table (at least 2).
#[must_use]
pub fn longest_suffix_labels() -> usize {
    table().max_labels.max(2)
}
