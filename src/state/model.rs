use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The persisted record of everything the poller has already seen.
///
/// Maps each feed fingerprint to the ordered sequence of item fingerprints
/// observed under it. The sequence is semantically a set ([`record`] never
/// appends a duplicate) and it only ever grows: no eviction, no TTL, no
/// reordering. Serialized form is a single JSON object
/// `{ "<feed hex>": ["<item hex>", ...], ... }`, and the `BTreeMap` keeps
/// key order deterministic across saves.
///
/// [`record`]: ProcessedState::record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessedState {
    feeds: BTreeMap<String, Vec<String>>,
}

impl ProcessedState {
    /// Ensures a seen-set exists for `feed_key`, inserting an empty one the
    /// first time the feed is observed.
    pub fn ensure_feed(&mut self, feed_key: &str) {
        if !self.feeds.contains_key(feed_key) {
            self.feeds.insert(feed_key.to_owned(), Vec::new());
        }
    }

    /// Records `item_key` under `feed_key` if it has not been seen before.
    ///
    /// Returns `true` when the key was new (and is now recorded), `false`
    /// when it was already present. Membership is a linear scan; seen-sets
    /// are feed-sized, tens of entries, and the persisted form is an ordered
    /// sequence anyway.
    pub fn record(&mut self, feed_key: &str, item_key: String) -> bool {
        let seen = self.feeds.entry(feed_key.to_owned()).or_default();
        if seen.iter().any(|k| *k == item_key) {
            return false;
        }
        seen.push(item_key);
        true
    }

    /// True if `item_key` has been recorded under `feed_key`.
    pub fn contains(&self, feed_key: &str, item_key: &str) -> bool {
        self.feeds
            .get(feed_key)
            .is_some_and(|seen| seen.iter().any(|k| k == item_key))
    }

    /// The seen-set for a feed, in recording order.
    pub fn seen(&self, feed_key: &str) -> Option<&[String]> {
        self.feeds.get(feed_key).map(Vec::as_slice)
    }

    /// Number of feeds that have ever been observed.
    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }

    /// Total number of item fingerprints recorded across all feeds.
    pub fn item_count(&self) -> usize {
        self.feeds.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ensure_feed_inserts_empty_set_once() {
        let mut state = ProcessedState::default();
        state.ensure_feed("f1");
        assert_eq!(state.seen("f1"), Some(&[][..]));

        state.record("f1", "i1".into());
        state.ensure_feed("f1"); // must not clear the existing set
        assert_eq!(state.seen("f1").unwrap().len(), 1);
    }

    #[test]
    fn test_record_returns_true_for_new_false_for_seen() {
        let mut state = ProcessedState::default();
        assert!(state.record("f1", "i1".into()));
        assert!(!state.record("f1", "i1".into()));
        assert_eq!(state.seen("f1").unwrap().len(), 1);
    }

    #[test]
    fn test_record_preserves_insertion_order() {
        let mut state = ProcessedState::default();
        state.record("f1", "c".into());
        state.record("f1", "a".into());
        state.record("f1", "b".into());
        assert_eq!(state.seen("f1").unwrap(), &["c", "a", "b"]);
    }

    #[test]
    fn test_feeds_are_isolated() {
        let mut state = ProcessedState::default();
        state.record("f1", "i1".into());
        assert!(!state.contains("f2", "i1"));
        assert!(state.record("f2", "i1".into()));
    }

    #[test]
    fn test_counts() {
        let mut state = ProcessedState::default();
        assert!(state.is_empty());
        state.record("f1", "i1".into());
        state.record("f1", "i2".into());
        state.record("f2", "i3".into());
        assert_eq!(state.feed_count(), 2);
        assert_eq!(state.item_count(), 3);
    }

    #[test]
    fn test_json_shape_is_flat_object_of_arrays() {
        let mut state = ProcessedState::default();
        state.record("aaaa", "1111".into());
        state.record("aaaa", "2222".into());

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"aaaa":["1111","2222"]}"#);

        let back: ProcessedState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_deserializes_legacy_state_file() {
        // The exact shape older releases wrote to processed.json.
        let json = r#"{"0d6ce3de266a5f4327a5633ab75ded4f":["1368a45c37d2cced836865e4649088d3"]}"#;
        let state: ProcessedState = serde_json::from_str(json).unwrap();
        assert_eq!(state.feed_count(), 1);
        assert!(state.contains(
            "0d6ce3de266a5f4327a5633ab75ded4f",
            "1368a45c37d2cced836865e4649088d3"
        ));
    }
}
