//! Feed acquisition: URL list, HTTP fetch, and RSS parsing.
//!
//! The three submodules cover the front half of the pipeline:
//!
//! - [`sources`] - Reads the feed URL list file into validated HTTPS URLs
//! - [`fetcher`] - Single-shot HTTP retrieval with timeout and size limits
//! - [`parser`] - RSS XML into the normalized [`Feed`]/[`FeedItem`] model
//!
//! Every failure in this module is per-URL: the pipeline logs it and moves on
//! to the next feed.

mod fetcher;
mod parser;
mod sources;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_feed, Feed, FeedItem, ParseError};
pub use sources::read_feed_urls;
