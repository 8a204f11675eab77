use crate::feed::{Feed, FeedItem};
use crate::fingerprint::fingerprint;
use crate::state::ProcessedState;

/// Outcome of reconciling one parsed feed against the processed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Fingerprint identifying the feed (`[channel title, channel link]`).
    pub feed_key: String,
    /// Items not previously recorded under `feed_key`, in document order.
    pub new_items: Vec<FeedItem>,
}

/// Diffs a parsed feed against the processed state and records what it finds.
///
/// The feed is identified by the fingerprint of its channel title and link;
/// each item by the fingerprint of its item title and link. A feed key not
/// yet in `state` gets an empty seen-set, then every item whose key is unseen
/// is appended to the returned `new_items` and to the seen-set, preserving
/// the feed's item order.
///
/// Mutates `state` in place and only ever grows it. Idempotent with respect
/// to already-seen items: reconciling the same feed content again returns no
/// new items and leaves `state` unchanged.
pub fn reconcile(feed: &Feed, state: &mut ProcessedState) -> Reconciliation {
    let feed_key = fingerprint(&[feed.title.as_deref(), feed.link.as_deref()]);
    state.ensure_feed(&feed_key);

    let mut new_items = Vec::new();
    for item in &feed.items {
        let item_key = fingerprint(&[item.title.as_deref(), item.link.as_deref()]);
        if state.record(&feed_key, item_key) {
            new_items.push(item.clone());
        }
    }

    Reconciliation { feed_key, new_items }
}
