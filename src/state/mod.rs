//! Persisted run/pause state

pub mod run_state;
pub mod storage;

pub use run_state::RunState;
pub use storage::{FileStorage, MemoryStorage, StateStorage};
