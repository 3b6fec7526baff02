//! Key event dispatch

pub mod dispatcher;

pub use dispatcher::{BindingOutcome, DispatchError, DispatchOutcome, Dispatcher};
