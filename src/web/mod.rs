//! Browser host
//!
//! Compiled to wasm and loaded as the extension's content script. `start`
//! wires the web adapters into a `Dispatcher` and attaches the key listener.

mod dom;
mod extension;

pub use dom::{FunctionRunner, WebClipboard, WebDocument, WebElement, WebNavigator};
pub use extension::{EventNotifier, ExtensionBridge, FetchConfigLoader, LocalStorage};

use anyhow::Result;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{KeyboardEvent, Window};

use crate::actions::ActionExecutor;
use crate::config::EngineSettings;
use crate::constants::events;
use crate::dispatch::Dispatcher;
use crate::input::KeyEvent;
use crate::state::RunState;

fn build_dispatcher(window: &Window) -> Result<Dispatcher> {
    let settings = EngineSettings::default();
    let executor = ActionExecutor::new(
        Rc::new(WebDocument::new(window.clone())?),
        Rc::new(WebClipboard::new(window.clone())),
        Rc::new(WebNavigator::new(window.clone())),
        Rc::new(FunctionRunner),
        Rc::new(ExtensionBridge),
    );
    Ok(Dispatcher::new(
        Rc::new(FetchConfigLoader::new(window.clone())),
        RunState::new(Rc::new(LocalStorage::new(window)?), settings.restore_ordering),
        executor,
        Rc::new(EventNotifier::new(window.clone())),
        settings,
    ))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let dispatcher = build_dispatcher(&window)
        .map(Rc::new)
        .map_err(|e: anyhow::Error| JsValue::from_str(&format!("{:#}", e)))?;

    // Not awaited: events arriving before it resolves see the default state
    let restoring = dispatcher.clone();
    spawn_local(async move {
        restoring.restore_run_state().await;
    });

    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))?;
    let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
        let key = KeyEvent::new(event.key(), event.shift_key());
        let dispatcher = dispatcher.clone();
        spawn_local(async move {
            dispatcher.on_key(&key).await;
        });
    });
    document.add_event_listener_with_callback(events::KEY_RELEASE, closure.as_ref().unchecked_ref())?;
    closure.forget();

    Ok(())
}
