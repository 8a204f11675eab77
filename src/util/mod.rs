//! Shared utilities.
//!
//! Currently just URL validation: security-focused checks applied to every
//! line of the feed list before it is allowed to reach the fetcher.

mod url_validator;

pub use url_validator::{validate_feed_url, UrlValidationError};
