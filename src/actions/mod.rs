//! Declarative action execution

pub mod executor;

pub use executor::{ActionError, ActionExecutor, ActionOutcome};
