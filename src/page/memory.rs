//! In-memory page
//!
//! Parses an HTML snapshot with `scraper` and evaluates selectors against it.
//! The parsed tree itself never changes; clicks, focus, written values and
//! scratch nodes live in a side table keyed by element position in document
//! order. Used by the CLI to replay key events and by tests to observe effects.

use scraper::{ElementRef, Html, Selector};
use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::debug;

use super::clipboard::MemoryClipboard;
use super::dom::{Capability, Document, Element, ScratchId};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// What the page has recorded since it was loaded
#[derive(Debug, Default)]
struct PageState {
    clicks: HashMap<usize, u32>,
    values: HashMap<usize, String>,
    focused: Option<usize>,
    scratch: BTreeMap<u32, String>,
    next_scratch: u32,
    selection: Option<String>,
}

struct Page {
    html: Html,
    state: RefCell<PageState>,
}

impl Page {
    /// Every element, in document order
    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
    }

    fn element(&self, index: usize) -> Option<ElementRef<'_>> {
        self.elements().nth(index)
    }

    /// Position of the first element matching `selector`
    fn find(&self, selector: &str) -> Option<usize> {
        let selector = match Selector::parse(selector) {
            Ok(selector) => selector,
            Err(e) => {
                debug!(selector = selector, error = %e, "Selector rejected");
                return None;
            }
        };
        let found = self.html.select(&selector).next()?;
        self.elements().position(|element| element == found)
    }

    fn describe(&self, index: usize) -> String {
        let Some(element) = self.element(index) else {
            return String::new();
        };
        let element = element.value();
        let mut description = element.name().to_string();
        if let Some(id) = element.id() {
            description.push('#');
            description.push_str(id);
        }
        for class in element.classes() {
            description.push('.');
            description.push_str(class);
        }
        description
    }

    /// Form value as loaded: `value` attribute, textarea text, or the
    /// selected (else first) option of a select
    fn initial_value(element: ElementRef<'_>) -> Option<String> {
        match element.value().name() {
            "input" => Some(element.value().attr("value").unwrap_or_default().to_string()),
            "textarea" => Some(element.text().collect()),
            "select" => {
                let options = Selector::parse("option").ok()?;
                let options: Vec<_> = element.select(&options).collect();
                let chosen = options
                    .iter()
                    .find(|option| option.value().attr("selected").is_some())
                    .or(options.first());
                Some(chosen.map(|option| option_value(*option)).unwrap_or_default())
            }
            _ => None,
        }
    }
}

fn option_value(option: ElementRef<'_>) -> String {
    match option.value().attr("value") {
        Some(value) => value.to_string(),
        None => option.text().collect::<String>().trim().to_string(),
    }
}

/// Element handle into a `MemoryDocument`
pub struct MemoryElement {
    page: Rc<Page>,
    index: usize,
}

impl MemoryElement {
    fn with_element<T>(&self, f: impl FnOnce(ElementRef<'_>) -> T) -> Option<T> {
        self.page.element(self.index).map(f)
    }
}

impl Element for MemoryElement {
    fn describe(&self) -> String {
        self.page.describe(self.index)
    }

    fn supports(&self, capability: Capability) -> bool {
        self.with_element(|element| {
            let value = element.value();
            match capability {
                // Only HTML elements have click()/focus(); svg and math do not
                Capability::Click | Capability::Focus => &*value.name.ns == HTML_NAMESPACE,
                Capability::WriteValue => {
                    matches!(value.name(), "input" | "textarea" | "select")
                }
            }
        })
        .unwrap_or(false)
    }

    fn click(&self) {
        *self
            .page
            .state
            .borrow_mut()
            .clicks
            .entry(self.index)
            .or_default() += 1;
    }

    fn focus(&self) {
        self.page.state.borrow_mut().focused = Some(self.index);
    }

    fn text_content(&self) -> Option<String> {
        self.with_element(|element| element.text().collect())
    }

    fn value(&self) -> Option<String> {
        if let Some(value) = self.page.state.borrow().values.get(&self.index) {
            return Some(value.clone());
        }
        self.with_element(Page::initial_value).flatten()
    }

    fn set_value(&self, value: &str) {
        self.page
            .state
            .borrow_mut()
            .values
            .insert(self.index, value.to_string());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-memory `Document`
pub struct MemoryDocument {
    url: String,
    page: Rc<Page>,
    /// Target of the document copy command (clipboard fallback)
    clipboard: Option<Rc<MemoryClipboard>>,
}

impl MemoryDocument {
    /// Parse `html` as the document loaded at `url`
    pub fn new(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            page: Rc::new(Page {
                html: Html::parse_document(html),
                state: RefCell::new(PageState::default()),
            }),
            clipboard: None,
        }
    }

    /// Route the document copy command into `clipboard`
    pub fn with_clipboard(mut self, clipboard: Rc<MemoryClipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Times the first element matching `selector` was clicked
    pub fn click_count(&self, selector: &str) -> u32 {
        self.page
            .find(selector)
            .and_then(|index| self.page.state.borrow().clicks.get(&index).copied())
            .unwrap_or(0)
    }

    /// Clicks across all elements
    pub fn total_clicks(&self) -> u32 {
        self.page.state.borrow().clicks.values().sum()
    }

    /// Description of the focused element
    pub fn focused(&self) -> Option<String> {
        let focused = self.page.state.borrow().focused;
        focused.map(|index| self.page.describe(index))
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        let index = self.page.find(selector)?;
        MemoryElement {
            page: self.page.clone(),
            index,
        }
        .value()
    }

    /// Scratch nodes currently attached
    pub fn scratch_count(&self) -> usize {
        self.page.state.borrow().scratch.len()
    }
}

impl Document for MemoryDocument {
    fn location(&self) -> String {
        self.url.clone()
    }

    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>> {
        let index = self.page.find(selector)?;
        Some(Rc::new(MemoryElement {
            page: self.page.clone(),
            index,
        }))
    }

    fn attach_scratch(&self, text: &str) -> Option<ScratchId> {
        let mut state = self.page.state.borrow_mut();
        let id = state.next_scratch;
        state.next_scratch = id.wrapping_add(1);
        state.scratch.insert(id, text.to_string());
        state.selection = Some(text.to_string());
        Some(ScratchId(id))
    }

    fn copy_selection(&self) -> bool {
        let selection = self.page.state.borrow().selection.clone();
        match (selection, &self.clipboard) {
            (Some(text), Some(clipboard)) => {
                clipboard.store(&text);
                true
            }
            _ => false,
        }
    }

    fn detach_scratch(&self, id: ScratchId) {
        let mut state = self.page.state.borrow_mut();
        if let Some(text) = state.scratch.remove(&id.0)
            && state.selection.as_deref() == Some(text.as_str())
        {
            state.selection = None;
        }
    }
}
