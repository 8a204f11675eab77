use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::model::ProcessedState;

/// Errors from loading or saving the processed-state file.
///
/// Unlike fetch and parse failures these are pass-global: a corrupt state
/// file must stop the pass (proceeding with a silently-emptied state would
/// re-notify every item ever seen), and a failed save means the whole pass's
/// dedup progress is lost.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to access state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads and saves the [`ProcessedState`] as a single JSON file.
///
/// The store performs one whole-file read at pass start and one whole-file
/// write at pass end; it is a single-writer design with no locking.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted state.
    ///
    /// A missing file is the normal first-run case and yields an empty state.
    /// An existing file that cannot be read or does not parse as the expected
    /// mapping is [`StateError::Corrupt`]; the caller must treat that as
    /// fatal for the pass rather than continue with an empty state.
    pub fn load(&self) -> Result<ProcessedState, StateError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No state file found, starting empty");
                return Ok(ProcessedState::default());
            }
            Err(e) => return Err(StateError::Io(e)),
        };

        let state: ProcessedState =
            serde_json::from_str(&content).map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        tracing::info!(
            path = %self.path.display(),
            feeds = state.feed_count(),
            items = state.item_count(),
            "Loaded processed state"
        );
        Ok(state)
    }

    /// Persists the full state, creating the parent directory if absent.
    ///
    /// The write is atomic: serialize to a randomized temp file in the target
    /// directory, sync it to disk, then rename over the destination. A crash
    /// mid-write leaves the previous state file intact.
    pub fn save(&self, state: &ProcessedState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_vec(state).map_err(|source| StateError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        // SEC-009: Randomized temp filename prevents TOCTOU races. An
        // attacker cannot pre-create a symlink at an unpredictable path.
        use std::time::{SystemTime, UNIX_EPOCH};
        let random_suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = self.path.with_extension(format!("tmp.{:016x}", random_suffix));

        let mut temp_file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true) // Fails atomically if file exists (prevents symlink race)
            .open(&temp_path)?;

        if let Err(e) = temp_file
            .write_all(&content)
            .and_then(|_| temp_file.sync_all())
        {
            let _ = std::fs::remove_file(&temp_path);
            return Err(StateError::Io(e));
        }

        // Drop the file handle before rename
        drop(temp_file);

        // Atomic rename (POSIX guarantees atomicity for rename on same filesystem)
        // On Windows, rename fails if destination exists, so remove it first
        #[cfg(windows)]
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                let _ = std::fs::remove_file(&temp_path);
                return Err(StateError::Io(e));
            }
        }

        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(StateError::Io(e));
        }

        tracing::info!(
            path = %self.path.display(),
            feeds = state.feed_count(),
            items = state.item_count(),
            "Saved processed state"
        );
        Ok(())
    }
}
