//! Authentication state persistence
//!
//! One JSON file, overwritten in place. A missing or unparsable file yields
//! a fresh default state rather than an error, so the tool stays usable
//! after corruption — at the cost of silently discarding whatever was there.
//! No locking is performed; two concurrent invocations race with
//! last-writer-wins semantics (and possible counter reuse).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::state::AuthState;

/// Loads and saves an [`AuthState`] at a fixed path.
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

    /// Load the persisted state, falling back to a default record.
    pub fn load(&self) -> AuthState {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %self.path.display(), "no state file ({e}), starting fresh");
                return AuthState::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(state) => {
                debug!(path = %self.path.display(), "loaded auth state");
                state
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    "state file is corrupt ({e}), discarding it and starting fresh"
                );
                AuthState::default()
            }
        }
    }

    /// Serialize and overwrite the state file.
    pub fn save(&self, state: &AuthState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "saved auth state");
        Ok(())
    }
}
