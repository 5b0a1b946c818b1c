//! Ordered field-pair accumulation
//!
//! [`IndexedFieldPairs`] is the ordered, index-keyed container that the
//! per-protocol extractors populate and the composers consume. Indices are
//! assigned by insertion order and are strictly increasing and contiguous
//! within one message-build pass; the split between "static" fields (below
//! the dynamic-start index) and "dynamic" fields relies on that invariant.

use std::collections::BTreeMap;

pub mod extract;

pub use extract::{application_field_pairs, siem_required_field_pairs, FieldExtractor};

/// Separator between rendered `key=value` tokens within one line
pub const PAIR_SEPARATOR: &str = ",";

/// Ordered `(index, (key, value))` accumulator for one DPI record
///
/// Created empty per record, populated by the extractor sequence for that
/// record's protocol, consumed once by the composers, then discarded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexedFieldPairs {
    pairs: BTreeMap<u32, (String, String)>,
}

impl IndexedFieldPairs {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair at `index`
    ///
    /// Returns `false` without inserting when the index would break the
    /// strictly-increasing invariant (duplicate, or not past the current
    /// highest index).
    pub fn insert(&mut self, index: u32, key: impl Into<String>, value: impl Into<String>) -> bool {
        if let Some((&last, _)) = self.pairs.iter().next_back() {
            if index <= last {
                return false;
            }
        }
        self.pairs.insert(index, (key.into(), value.into()));
        true
    }

    /// Number of accumulated pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pairs have been accumulated
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Look up the pair stored at `index`
    pub fn get(&self, index: u32) -> Option<&(String, String)> {
        self.pairs.get(&index)
    }

    /// Iterate pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &(String, String))> {
        self.pairs.iter().map(|(&i, pair)| (i, pair))
    }

    /// Cursor over all pairs, for one-token-at-a-time rendering
    pub fn cursor(&self) -> PairCursor<'_> {
        self.cursor_from(0)
    }

    /// Cursor positioned at the first pair with index `>= start`
    pub fn cursor_from(&self, start: u32) -> PairCursor<'_> {
        PairCursor {
            inner: self.pairs.range(start..),
        }
    }

    /// Render every pair with index below `dynamic_start` into the reusable
    /// static prefix string
    ///
    /// Deterministic: depends only on the entries below `dynamic_start`, so
    /// repeated calls with the same arguments yield an identical string.
    pub fn static_info(&self, dynamic_start: u32) -> String {
        let mut prefix = String::new();
        for (_, (key, value)) in self.pairs.range(..dynamic_start) {
            if !prefix.is_empty() {
                prefix.push_str(PAIR_SEPARATOR);
            }
            prefix.push_str(&format_pair(key, value));
        }
        prefix
    }
}

/// Cursor that renders exactly one pair per call, in index order
///
/// Calling [`PairCursor::next_data_pair`] past the end is defined to return
/// an empty token without fault.
pub struct PairCursor<'a> {
    inner: std::collections::btree_map::Range<'a, u32, (String, String)>,
}

impl PairCursor<'_> {
    /// Render the pair under the cursor as a `key=value` token and advance
    pub fn next_data_pair(&mut self) -> String {
        self.inner
            .next()
            .map(|(_, (key, value))| format_pair(key, value))
            .unwrap_or_default()
    }
}

/// Render one `(key, value)` pair as a wire token
pub fn format_pair(key: &str, value: &str) -> String {
    format!("{key}={value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IndexedFieldPairs {
        let mut pairs = IndexedFieldPairs::new();
        assert!(pairs.insert(0, "session", "abc"));
        assert!(pairs.insert(1, "time", "t0"));
        assert!(pairs.insert(2, "url", "http://x/y"));
        pairs
    }

    #[test]
    fn insert_rejects_non_increasing_indices() {
        let mut pairs = sample();
        assert!(!pairs.insert(2, "dup", "x"));
        assert!(!pairs.insert(1, "lower", "x"));
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.get(2).unwrap().0, "url");
    }

    #[test]
    fn static_info_renders_only_below_dynamic_start() {
        let pairs = sample();
        assert_eq!(pairs.static_info(2), "session=abc,time=t0");
        assert_eq!(pairs.static_info(1), "session=abc");
        assert_eq!(pairs.static_info(0), "");
    }

    #[test]
    fn static_info_is_idempotent() {
        let pairs = sample();
        let first = pairs.static_info(2);
        let second = pairs.static_info(2);
        assert_eq!(first, second);
    }

    #[test]
    fn cursor_visits_every_entry_once_then_yields_empty() {
        let pairs = sample();
        let mut cursor = pairs.cursor();
        assert_eq!(cursor.next_data_pair(), "session=abc");
        assert_eq!(cursor.next_data_pair(), "time=t0");
        assert_eq!(cursor.next_data_pair(), "url=http://x/y");
        assert_eq!(cursor.next_data_pair(), "");
        assert_eq!(cursor.next_data_pair(), "");
    }

    #[test]
    fn cursor_from_skips_static_entries() {
        let pairs = sample();
        let mut cursor = pairs.cursor_from(2);
        assert_eq!(cursor.next_data_pair(), "url=http://x/y");
        assert_eq!(cursor.next_data_pair(), "");
    }

    #[test]
    fn empty_accumulator_has_empty_prefix_and_cursor() {
        let pairs = IndexedFieldPairs::new();
        assert!(pairs.is_empty());
        assert_eq!(pairs.static_info(10), "");
        assert_eq!(pairs.cursor().next_data_pair(), "");
    }
}
