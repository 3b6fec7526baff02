//! Per-event dispatch
//!
//! One cycle per key-release event:
//! load config → toggle gesture? → paused? → match bindings in order →
//! execute → notify. Cycles share nothing but the run flag; two cycles may
//! interleave at their await points and the last write to the flag wins.

use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::actions::{ActionExecutor, ActionOutcome};
use crate::config::{Binding, ConfigLoader, EngineSettings, MatchPolicy};
use crate::constants::notification;
use crate::input::{KeyEvent, matches_key};
use crate::notify::{Notification, Notifier};
use crate::state::RunState;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Mappings could not be fetched or parsed; the engine is off for this event
    #[error("mappings unavailable")]
    ConfigUnavailable(#[source] anyhow::Error),
    /// A URL pattern failed to compile when matching reached it
    #[error("invalid URL pattern {pattern:?} in binding {index}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Action result for one binding that matched URL and key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOutcome {
    /// Position of the binding in the mappings list
    pub index: usize,
    pub outcome: ActionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event was the pause/resume gesture; bindings were not evaluated
    Toggled { running: bool },
    /// Dispatch is paused and the event was not the resume gesture
    Paused,
    /// Bindings evaluated; one entry per binding whose action ran, in order
    Matched(Vec<BindingOutcome>),
}

impl DispatchOutcome {
    /// Bindings whose action succeeded
    pub fn acted(&self) -> Vec<usize> {
        match self {
            DispatchOutcome::Matched(outcomes) => outcomes
                .iter()
                .filter(|o| o.outcome.success())
                .map(|o| o.index)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Event-driven controller tying config, run state, matcher and executor together
pub struct Dispatcher {
    loader: Rc<dyn ConfigLoader>,
    run_state: RunState,
    executor: ActionExecutor,
    notifier: Rc<dyn Notifier>,
    settings: EngineSettings,
}

impl Dispatcher {
    pub fn new(
        loader: Rc<dyn ConfigLoader>,
        run_state: RunState,
        executor: ActionExecutor,
        notifier: Rc<dyn Notifier>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            loader,
            run_state,
            executor,
            notifier,
            settings,
        }
    }

    #[cfg(test)]
    fn run_state(&self) -> &RunState {
        &self.run_state
    }

    /// Apply the persisted run flag. Hosts start this without awaiting it
    /// before the listener goes live.
    pub async fn restore_run_state(&self) -> Option<bool> {
        self.run_state.restore().await
    }

    /// Listener entry point: run one cycle, log and swallow failures
    pub async fn on_key(&self, event: &KeyEvent) {
        match self.handle_key(event).await {
            Ok(outcome) => debug!(key = %event, outcome = ?outcome, "Dispatch cycle finished"),
            Err(e @ DispatchError::ConfigUnavailable(_)) => {
                debug!(key = %event, error = %e, "Skipping key event")
            }
            Err(e) => warn!(key = %event, error = %e, "Dispatch cycle aborted"),
        }
    }

    /// Run one dispatch cycle for a key-release event
    pub async fn handle_key(&self, event: &KeyEvent) -> Result<DispatchOutcome, DispatchError> {
        let table = self
            .loader
            .load()
            .await
            .map_err(DispatchError::ConfigUnavailable)?;

        if self.is_toggle_gesture(event) {
            let running = self.run_state.toggle().await;
            self.notify(if running {
                notification::RESUMED_MESSAGE.to_string()
            } else {
                notification::PAUSED_MESSAGE.to_string()
            });
            return Ok(DispatchOutcome::Toggled { running });
        }

        if !self.run_state.get() {
            debug!(key = %event, "Paused, ignoring key event");
            return Ok(DispatchOutcome::Paused);
        }

        let url = self.executor.document().location();
        let mut outcomes = Vec::new();

        for (index, compiled) in table.bindings().iter().enumerate() {
            let binding = &compiled.binding;
            let url_matches =
                compiled
                    .matches_url(&url)
                    .map_err(|source| DispatchError::InvalidPattern {
                        index,
                        pattern: binding.url.clone(),
                        source,
                    })?;
            if !url_matches || !matches_key(event, &binding.key) {
                continue;
            }

            debug!(binding = index, key = %event, url = %url, action = %binding.action.kind, "Binding matched");

            let element = self.executor.resolve(&binding.action);
            let outcome = self
                .executor
                .execute(element.as_deref(), &binding.action)
                .await;

            if outcome.notify_worthy() {
                self.notify(action_message(binding));
            }

            let success = outcome.success();
            outcomes.push(BindingOutcome { index, outcome });

            let stop = match self.settings.match_policy {
                MatchPolicy::FirstSuccess => success,
                MatchPolicy::FirstMatch => true,
                MatchPolicy::All => false,
            };
            if stop {
                break;
            }
        }

        if outcomes.is_empty() {
            debug!(key = %event, url = %url, "No binding matched");
        }
        Ok(DispatchOutcome::Matched(outcomes))
    }

    /// Pause key while running, resume key while paused
    fn is_toggle_gesture(&self, event: &KeyEvent) -> bool {
        if self.run_state.get() {
            event.key == self.settings.pause_key
        } else {
            matches_key(event, &self.settings.resume_key)
        }
    }

    fn notify(&self, message: String) {
        if !self.settings.notifications {
            return;
        }
        info!(message = %message, "Notifying");
        self.notifier.notify(Notification {
            title: notification::TITLE.to_string(),
            message,
            location: self.settings.notification_location.clone(),
            dismissable: true,
        });
    }
}

/// e.g. "Shift+F: click #try_it > a"
fn action_message(binding: &Binding) -> String {
    match &binding.action.selector {
        Some(selector) => format!("{}: {} {}", binding.key, binding.action.kind, selector),
        None => format!("{}: {}", binding.key, binding.action.kind),
    }
}
