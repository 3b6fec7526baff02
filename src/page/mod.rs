//! Page-side ports the engine acts through
//!
//! Document/element access, the system clipboard, navigation and the
//! custom-script runner, plus in-memory implementations of each.

pub mod clipboard;
pub mod dom;
pub mod memory;
pub mod navigation;

pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard};
pub use dom::{Capability, Document, Element, ScratchGuard, ScratchId};
pub use memory::{MemoryDocument, MemoryElement};
pub use navigation::{
    CodeRunner, NavigationCall, Navigator, RecordingNavigator, RecordingRunner,
};
