#![deny(unsafe_code)]

//! Declarative per-site keyboard shortcuts
//!
//! Key-release events are matched against a list of (URL pattern, key,
//! action) bindings and the first applicable action runs against the page.
//! Every browser capability sits behind a port so the engine runs the same
//! on the native simulator and inside the extension (feature `web`).

pub mod actions;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod input;
pub mod notify;
pub mod page;
pub mod state;

#[cfg(feature = "web")]
pub mod web;

#[cfg(test)]
mod testing;
