use std::path::Path;
use url::Url;

use crate::util::validate_feed_url;

/// Reads the feed URL list from a plain text file, one candidate per line.
///
/// Lines are trimmed; blank lines and anything that fails HTTPS-only
/// validation (non-HTTPS scheme, unparseable URL, localhost or private-range
/// host) are skipped with a debug log. Order of surviving URLs follows file
/// order.
///
/// A missing file is not an error: it yields an empty list with a warning,
/// which makes the subsequent pass a valid no-op.
pub fn read_feed_urls(path: &Path) -> Vec<Url> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Feed list file not found");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read feed list file");
            return Vec::new();
        }
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match validate_feed_url(line) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!(line = line, error = %e, "Skipping invalid feed URL line");
                None
            }
        })
        .collect()
}
