//! `web_sys` implementations of the page ports

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    HtmlDocument, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, Window,
};

use crate::page::{
    Capability, Clipboard, ClipboardError, CodeRunner, Document, Element, Navigator, ScratchId,
};

/// Best-effort message out of a thrown JS value
pub(crate) fn js_error(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    match value.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => format!("{:?}", value),
    }
}

pub struct WebElement {
    element: web_sys::Element,
}

impl WebElement {
    pub fn new(element: web_sys::Element) -> Self {
        Self { element }
    }

    pub fn raw(&self) -> &web_sys::Element {
        &self.element
    }

    fn html(&self) -> Option<&HtmlElement> {
        self.element.dyn_ref::<HtmlElement>()
    }
}

impl Element for WebElement {
    fn describe(&self) -> String {
        let tag = self.element.tag_name().to_lowercase();
        let id = self.element.id();
        if id.is_empty() {
            tag
        } else {
            format!("{}#{}", tag, id)
        }
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Click | Capability::Focus => self.html().is_some(),
            Capability::WriteValue => {
                self.element.is_instance_of::<HtmlInputElement>()
                    || self.element.is_instance_of::<HtmlTextAreaElement>()
                    || self.element.is_instance_of::<HtmlSelectElement>()
            }
        }
    }

    fn click(&self) {
        if let Some(html) = self.html() {
            html.click();
        }
    }

    fn focus(&self) {
        if let Some(Err(e)) = self.html().map(|html| html.focus()) {
            warn!(element = %self.describe(), error = %js_error(&e), "Focus failed");
        }
    }

    fn text_content(&self) -> Option<String> {
        self.element.text_content()
    }

    fn value(&self) -> Option<String> {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            Some(input.value())
        } else if let Some(textarea) = self.element.dyn_ref::<HtmlTextAreaElement>() {
            Some(textarea.value())
        } else {
            self.element
                .dyn_ref::<HtmlSelectElement>()
                .map(|select| select.value())
        }
    }

    fn set_value(&self, value: &str) {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(textarea) = self.element.dyn_ref::<HtmlTextAreaElement>() {
            textarea.set_value(value);
        } else if let Some(select) = self.element.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The live page document
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
    scratch: RefCell<HashMap<u32, web_sys::Element>>,
    next_scratch: Cell<u32>,
}

impl WebDocument {
    pub fn new(window: Window) -> Result<Self> {
        let document = window
            .document()
            .ok_or_else(|| anyhow!("Window has no document"))?;
        Ok(Self {
            window,
            document,
            scratch: RefCell::new(HashMap::new()),
            next_scratch: Cell::new(0),
        })
    }

    fn create_scratch(&self, text: &str) -> Option<HtmlTextAreaElement> {
        let textarea = self
            .document
            .create_element("textarea")
            .ok()?
            .dyn_into::<HtmlTextAreaElement>()
            .ok()?;
        textarea.set_value(text);

        // Off-screen but still selectable
        let style = textarea.style();
        for (property, value) in [("position", "fixed"), ("left", "-9999px"), ("opacity", "0")] {
            if let Err(e) = style.set_property(property, value) {
                debug!(property = property, error = %js_error(&e), "Failed to style scratch node");
            }
        }

        self.document.body()?.append_child(&textarea).ok()?;
        textarea.select();
        Some(textarea)
    }
}

impl Document for WebDocument {
    fn location(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn query_selector(&self, selector: &str) -> Option<Rc<dyn Element>> {
        match self.document.query_selector(selector) {
            Ok(found) => found.map(|element| Rc::new(WebElement::new(element)) as Rc<dyn Element>),
            Err(e) => {
                debug!(selector = selector, error = %js_error(&e), "Invalid selector");
                None
            }
        }
    }

    fn attach_scratch(&self, text: &str) -> Option<ScratchId> {
        let textarea = self.create_scratch(text)?;
        let id = self.next_scratch.get();
        self.next_scratch.set(id.wrapping_add(1));
        self.scratch.borrow_mut().insert(id, textarea.into());
        Some(ScratchId(id))
    }

    fn copy_selection(&self) -> bool {
        match self.document.dyn_ref::<HtmlDocument>() {
            Some(html) => html.exec_command("copy").unwrap_or(false),
            None => false,
        }
    }

    fn detach_scratch(&self, id: ScratchId) {
        if let Some(element) = self.scratch.borrow_mut().remove(&id.0) {
            element.remove();
        }
    }
}

/// `navigator.clipboard`, looked up on every call
///
/// The property is absent outside secure contexts, which is reported as
/// `Unavailable` so the executor can use the scratch-node fallback.
pub struct WebClipboard {
    window: Window,
}

impl WebClipboard {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    async fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue, ClipboardError> {
        let navigator = self.window.navigator();
        let clipboard = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))
            .ok()
            .filter(|c| !c.is_undefined() && !c.is_null())
            .ok_or(ClipboardError::Unavailable)?;
        let function = js_sys::Reflect::get(&clipboard, &JsValue::from_str(method))
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
            .ok_or(ClipboardError::Unavailable)?;

        let args = args.iter().collect::<js_sys::Array>();
        let promise = js_sys::Reflect::apply(&function, &clipboard, &args)
            .map_err(|e| ClipboardError::Denied(js_error(&e)))?;
        JsFuture::from(js_sys::Promise::from(promise))
            .await
            .map_err(|e| ClipboardError::Denied(js_error(&e)))
    }
}

#[async_trait(?Send)]
impl Clipboard for WebClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.call("writeText", &[JsValue::from_str(text)]).await?;
        Ok(())
    }

    async fn read_text(&self) -> Result<String, ClipboardError> {
        self.call("readText", &[])
            .await?
            .as_string()
            .ok_or_else(|| ClipboardError::Denied("clipboard returned no text".to_string()))
    }
}

/// Session history and location of the current tab
pub struct WebNavigator {
    window: Window,
}

impl WebNavigator {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Navigator for WebNavigator {
    fn back(&self) {
        if let Err(e) = self.window.history().and_then(|h| h.back()) {
            warn!(error = %js_error(&e), "history.back failed");
        }
    }

    fn forward(&self) {
        if let Err(e) = self.window.history().and_then(|h| h.forward()) {
            warn!(error = %js_error(&e), "history.forward failed");
        }
    }

    fn reload(&self, bypass_cache: bool) {
        let location = self.window.location();
        let result = if bypass_cache {
            location.reload_with_forceget(true)
        } else {
            location.reload()
        };
        if let Err(e) = result {
            warn!(bypass_cache = bypass_cache, error = %js_error(&e), "Reload failed");
        }
    }
}

/// Compiles `custom_js` with the `Function` constructor; the code sees the
/// resolved element (or null) as `element`
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionRunner;

impl CodeRunner for FunctionRunner {
    fn run(&self, code: &str, element: Option<&dyn Element>) -> Result<()> {
        let constructor = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("Function"))
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| anyhow!("Function constructor unavailable"))?;

        let source = js_sys::Array::of2(&JsValue::from_str("element"), &JsValue::from_str(code));
        let function = js_sys::Reflect::construct(&constructor, &source)
            .map_err(|e| anyhow!("custom_js failed to compile: {}", js_error(&e)))?
            .dyn_into::<js_sys::Function>()
            .map_err(|_| anyhow!("custom_js did not compile to a function"))?;

        let target = element
            .and_then(|e| e.as_any().downcast_ref::<WebElement>())
            .map(|e| JsValue::from(e.raw().clone()))
            .unwrap_or(JsValue::NULL);
        function
            .call1(&JsValue::NULL, &target)
            .map_err(|e| anyhow!("custom_js threw: {}", js_error(&e)))?;
        Ok(())
    }
}
