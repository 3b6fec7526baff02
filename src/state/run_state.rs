//! Run/pause flag with persistence
//!
//! Starts out running. The startup restore reads the persisted value in the
//! background; key events handled before it resolves see the default.

use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use super::storage::StateStorage;
use crate::config::RestoreOrdering;
use crate::constants::storage::RUN_STATE_KEY;

/// The engine's single piece of cross-page state
pub struct RunState {
    running: Cell<bool>,
    /// Bumped on every `set`; lets a slow restore detect newer writes
    generation: Cell<u64>,
    ordering: RestoreOrdering,
    storage: Rc<dyn StateStorage>,
}

impl RunState {
    pub fn new(storage: Rc<dyn StateStorage>, ordering: RestoreOrdering) -> Self {
        Self {
            running: Cell::new(true),
            generation: Cell::new(0),
            ordering,
            storage,
        }
    }

    pub fn get(&self) -> bool {
        self.running.get()
    }

    /// Update the flag and persist it. Persistence failures are logged only.
    pub async fn set(&self, running: bool) {
        self.running.set(running);
        self.generation.set(self.generation.get() + 1);

        let encoded = match serde_json::to_string(&running) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Failed to encode run state");
                return;
            }
        };
        if let Err(e) = self.storage.write(RUN_STATE_KEY, &encoded).await {
            warn!(error = %e, running = running, "Failed to persist run state");
        }
    }

    /// Flip the flag, persist it, and return the new value
    pub async fn toggle(&self) -> bool {
        let running = !self.get();
        self.set(running).await;
        info!(running = running, "Run state toggled");
        running
    }

    /// Apply the persisted value, if any
    ///
    /// Returns the value that was applied. Missing, unreadable or unparsable
    /// entries leave the current value in place.
    pub async fn restore(&self) -> Option<bool> {
        let started_at = self.generation.get();

        let stored = match self.storage.read(RUN_STATE_KEY).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("No persisted run state, keeping default");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted run state");
                return None;
            }
        };

        let running: bool = match serde_json::from_str(&stored) {
            Ok(running) => running,
            Err(e) => {
                warn!(error = %e, stored = %stored, "Ignoring unparsable persisted run state");
                return None;
            }
        };

        if self.ordering == RestoreOrdering::PreferLocalWrites
            && self.generation.get() != started_at
        {
            debug!(
                stored = running,
                current = self.get(),
                "Run state changed during restore, dropping persisted value"
            );
            return None;
        }

        self.set(running).await;
        info!(running = running, "Restored run state");
        Some(running)
    }
}
