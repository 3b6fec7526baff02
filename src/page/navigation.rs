//! History/reload and page-script ports

use anyhow::Result;
use std::cell::RefCell;

use super::dom::Element;

/// Browser navigation primitives
pub trait Navigator {
    fn back(&self);
    fn forward(&self);
    /// `bypass_cache` forces a reload from the network
    fn reload(&self, bypass_cache: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationCall {
    Back,
    Forward,
    Reload { bypass_cache: bool },
}

/// Navigator that records calls instead of navigating
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    calls: RefCell<Vec<NavigationCall>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NavigationCall> {
        self.calls.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn back(&self) {
        self.calls.borrow_mut().push(NavigationCall::Back);
    }

    fn forward(&self) {
        self.calls.borrow_mut().push(NavigationCall::Forward);
    }

    fn reload(&self, bypass_cache: bool) {
        self.calls
            .borrow_mut()
            .push(NavigationCall::Reload { bypass_cache });
    }
}

/// Executes `custom_js` payloads in page context
///
/// This is arbitrary code execution by design of the tool; the runner is the
/// seam where a host can substitute something narrower.
pub trait CodeRunner {
    fn run(&self, code: &str, element: Option<&dyn Element>) -> Result<()>;
}

/// Runner that records the code it was asked to run
#[derive(Debug, Default)]
pub struct RecordingRunner {
    scripts: RefCell<Vec<String>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.borrow().clone()
    }
}

impl CodeRunner for RecordingRunner {
    fn run(&self, code: &str, _element: Option<&dyn Element>) -> Result<()> {
        self.scripts.borrow_mut().push(code.to_string());
        Ok(())
    }
}
