//! System clipboard port

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// No direct clipboard API in this context; callers may fall back
    #[error("clipboard API unavailable")]
    Unavailable,
    /// Permission refused or the API call failed
    #[error("clipboard access denied: {0}")]
    Denied(String),
}

#[async_trait(?Send)]
pub trait Clipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
    async fn read_text(&self) -> Result<String, ClipboardError>;
}

/// In-process clipboard
///
/// Can simulate a page without direct clipboard access (writes report
/// `Unavailable`) or a denied read permission.
#[derive(Debug)]
pub struct MemoryClipboard {
    contents: RefCell<Option<String>>,
    direct_access: Cell<bool>,
    read_denied: Cell<bool>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self {
            contents: RefCell::new(None),
            direct_access: Cell::new(true),
            read_denied: Cell::new(false),
        }
    }

    pub fn with_contents(text: &str) -> Self {
        let clipboard = Self::new();
        clipboard.store(text);
        clipboard
    }

    /// Writes through the API fail with `Unavailable`
    pub fn without_direct_access(self) -> Self {
        self.direct_access.set(false);
        self
    }

    pub fn deny_reads(&self, denied: bool) {
        self.read_denied.set(denied);
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    /// Store text bypassing the API (the document copy command lands here)
    pub fn store(&self, text: &str) {
        *self.contents.borrow_mut() = Some(text.to_string());
    }
}

impl Default for MemoryClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if !self.direct_access.get() {
            return Err(ClipboardError::Unavailable);
        }
        self.store(text);
        Ok(())
    }

    async fn read_text(&self) -> Result<String, ClipboardError> {
        if self.read_denied.get() {
            return Err(ClipboardError::Denied("read permission refused".to_string()));
        }
        Ok(self.contents().unwrap_or_default())
    }
}
