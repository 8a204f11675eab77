//! Persisted processed-state: which item fingerprints have been seen per feed.
//!
//! - [`ProcessedState`] is the in-memory mapping, mutated during a pass
//! - [`StateStore`] reads and writes it as a single JSON file, loaded once at
//!   pass start and saved once (atomically) at pass end

mod model;
mod store;

pub use model::ProcessedState;
pub use store::{StateError, StateStore};
