//! Keyboard input model and matching

pub mod event;
pub mod matcher;

pub use event::KeyEvent;
pub use matcher::{matches_key, matches_url};
