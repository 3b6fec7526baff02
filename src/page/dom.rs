//! Document and element ports
//!
//! The executor only ever sees these traits. The web host implements them
//! over `web_sys`; `MemoryDocument` implements them for tests and the CLI.

use std::any::Any;
use std::rc::Rc;

/// Optional abilities an element may lack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Click,
    Focus,
    /// Has a writable `value` field (inputs, textareas, selects)
    WriteValue,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Click => "click",
            Capability::Focus => "focus",
            Capability::WriteValue => "writable value",
        }
    }
}

/// A DOM element located by selector
pub trait Element {
    /// Short description for logs (e.g. `a#try_it_link`)
    fn describe(&self) -> String;

    fn supports(&self, capability: Capability) -> bool;

    /// Only called when `supports(Capability::Click)`
    fn click(&self);

    /// Only called when `supports(Capability::Focus)`
    fn focus(&self);

    fn text_content(&self) -> Option<String>;

    fn value(&self) -> Option<String>;

    /// Only called when `supports(Capability::WriteValue)`
    fn set_value(&self, value: &str);

    /// Lets a host-specific runner recover its own element type
    fn as_any(&self) -> &dyn Any;
}

/// Handle of a hidden scratch node created for the clipboard fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScratchId(pub u32);

/// The page the listener is attached to
pub trait Document {
    /// Full current URL
    fn location(&self) -> String;

    /// First element matching `selector` in document order
    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>>;

    /// Append a hidden editable node holding `text` and select its contents
    fn attach_scratch(&self, text: &str) -> Option<ScratchId>;

    /// Run the document copy command on the current selection
    fn copy_selection(&self) -> bool;

    fn detach_scratch(&self, id: ScratchId);
}

/// Scratch node that is removed from the document when dropped
pub struct ScratchGuard<'a> {
    document: &'a dyn Document,
    id: ScratchId,
}

impl<'a> ScratchGuard<'a> {
    pub fn attach(document: &'a dyn Document, text: &str) -> Option<Self> {
        let id = document.attach_scratch(text)?;
        Some(Self { document, id })
    }

    /// Copy the scratch node's (selected) contents
    pub fn copy(&self) -> bool {
        self.document.copy_selection()
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        self.document.detach_scratch(self.id);
    }
}
