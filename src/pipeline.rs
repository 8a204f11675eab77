use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::feed::{fetch_feed, parse_feed, read_feed_urls};
use crate::reconcile::reconcile;
use crate::state::{StateError, StateStore};

/// Delivery hook for newly discovered items.
///
/// Invoked at most once per new item per pass, in feed order then item order.
/// Actual delivery (email, webhooks) is out of scope here; implementations
/// plug in at this seam.
pub trait NotificationSink {
    fn notify(&mut self, feed_key: &str, item: &crate::feed::FeedItem);
}

/// Default sink: logs each new item. The placeholder where a real delivery
/// channel would hang.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, feed_key: &str, item: &crate::feed::FeedItem) {
        tracing::info!(
            feed_key = feed_key,
            title = item.title.as_deref().unwrap_or("(untitled)"),
            link = item.link.as_deref().unwrap_or("(no link)"),
            "New feed item"
        );
    }
}

/// Counters for one completed pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    /// Feeds fetched, parsed, and reconciled.
    pub feeds_processed: usize,
    /// URLs skipped due to a fetch or parse failure.
    pub feeds_failed: usize,
    /// New items discovered across all feeds.
    pub new_items: usize,
}

/// One-pass pipeline: URL list → fetch → parse → reconcile → persist.
///
/// Owns the per-pass resources (HTTP client, state store, paths) instead of
/// keeping them as module globals. URLs are processed strictly
/// sequentially; the state is touched only by the single active reconcile
/// call, so there is no synchronization to get wrong.
pub struct Pipeline {
    client: reqwest::Client,
    feeds_file: PathBuf,
    store: StateStore,
    request_timeout: Duration,
    max_response_bytes: usize,
}

impl Pipeline {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        Self {
            client,
            feeds_file: config.feeds_file.clone(),
            store: StateStore::new(&config.state_file),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_response_bytes: config.max_response_bytes as usize,
        }
    }

    /// Runs one full pass over the configured feed URL list file.
    ///
    /// Reads the list (missing file → empty list → trivial pass), then runs
    /// the URLs through [`run_urls`].
    ///
    /// [`run_urls`]: Pipeline::run_urls
    pub async fn run_pass(
        &self,
        sink: &mut dyn NotificationSink,
    ) -> Result<PassSummary, StateError> {
        let urls = read_feed_urls(&self.feeds_file);
        self.run_urls(&urls, sink).await
    }

    /// Runs one pass over an already-validated URL sequence.
    ///
    /// Per-URL fetch and parse failures are logged and skipped; one bad feed
    /// never aborts the rest. The two pass-fatal conditions are a corrupt
    /// state file at load and an I/O failure at save; both return
    /// [`StateError`] so the caller can fail loudly instead of silently
    /// losing dedup history.
    pub async fn run_urls(
        &self,
        urls: &[Url],
        sink: &mut dyn NotificationSink,
    ) -> Result<PassSummary, StateError> {
        tracing::info!(urls = urls.len(), "Processing rss feeds");
        let mut state = self.store.load()?;
        let mut summary = PassSummary::default();

        for url in urls {
            let body = match fetch_feed(
                &self.client,
                url.as_str(),
                self.request_timeout,
                self.max_response_bytes,
            )
            .await
            {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Unable to fetch feed");
                    summary.feeds_failed += 1;
                    continue;
                }
            };

            let feed = match parse_feed(&body) {
                Ok(feed) => feed,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Unable to parse feed");
                    summary.feeds_failed += 1;
                    continue;
                }
            };

            tracing::info!(
                url = %url,
                title = feed.title.as_deref().unwrap_or("(untitled)"),
                items = feed.items.len(),
                "Parsed feed"
            );

            let result = reconcile(&feed, &mut state);
            for item in &result.new_items {
                sink.notify(&result.feed_key, item);
            }
            summary.feeds_processed += 1;
            summary.new_items += result.new_items.len();
        }

        self.store.save(&state)?;
        tracing::info!(
            feeds = summary.feeds_processed,
            failed = summary.feeds_failed,
            new_items = summary.new_items,
            "Pass complete"
        );
        Ok(summary)
    }
}
