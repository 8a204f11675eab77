//! Polls RSS feeds and detects new items since the previous run.
//!
//! One pass: read the configured URL list, fetch and parse each feed in
//! order, fingerprint the channel and its items, diff against the persisted
//! processed-state, hand newly seen items to the notification sink, and save
//! the grown state atomically at the end.

pub mod config;
pub mod feed;
pub mod fingerprint;
pub mod pipeline;
pub mod reconcile;
pub mod state;
pub mod util;

pub use config::Config;
pub use feed::{Feed, FeedItem};
pub use pipeline::{LogSink, NotificationSink, PassSummary, Pipeline};
pub use reconcile::{reconcile, Reconciliation};
pub use state::{ProcessedState, StateStore};
