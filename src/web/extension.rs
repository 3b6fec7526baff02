//! Extension runtime adapters: background messaging, packaged mappings,
//! `localStorage` and the notification event

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CustomEvent, CustomEventInit, Response, Storage, Window};

use super::dom::js_error;
use crate::bridge::{BackgroundBridge, BridgeError, BridgeRequest, BridgeResponse};
use crate::config::{ConfigLoader, MappingTable};
use crate::constants::{config, events};
use crate::notify::{Notification, Notifier};
use crate::state::StateStorage;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = sendMessage, catch)]
    fn send_message(message: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = getURL)]
    fn runtime_url(path: &str) -> String;
}

/// `chrome.runtime.sendMessage` to the background script
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionBridge;

#[async_trait(?Send)]
impl BackgroundBridge for ExtensionBridge {
    async fn request(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        let message = serde_wasm_bindgen::to_value(&request)
            .map_err(|e| BridgeError::Rejected(e.to_string()))?;
        let promise = send_message(&message).map_err(|e| {
            debug!(error = %js_error(&e), "sendMessage threw");
            BridgeError::Disconnected
        })?;
        let reply = JsFuture::from(promise)
            .await
            .map_err(|e| BridgeError::Rejected(js_error(&e)))?;

        if reply.is_undefined() {
            return Err(BridgeError::UnexpectedResponse("no response".to_string()));
        }
        serde_wasm_bindgen::from_value(reply)
            .map_err(|e| BridgeError::UnexpectedResponse(e.to_string()))
    }
}

/// Fetches the mappings file packaged with the extension
#[derive(Debug, Clone)]
pub struct FetchConfigLoader {
    window: Window,
    url: String,
}

impl FetchConfigLoader {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            url: runtime_url(config::MAPPINGS_FILENAME),
        }
    }
}

#[async_trait(?Send)]
impl ConfigLoader for FetchConfigLoader {
    async fn load(&self) -> Result<MappingTable> {
        let response = JsFuture::from(self.window.fetch_with_str(&self.url))
            .await
            .map_err(|e| anyhow!("Failed to fetch {}: {}", self.url, js_error(&e)))?
            .dyn_into::<Response>()
            .map_err(|_| anyhow!("fetch did not return a Response"))?;
        if !response.ok() {
            bail!("Failed to fetch {}: HTTP {}", self.url, response.status());
        }

        let text = response
            .text()
            .map_err(|e| anyhow!("Failed to read {}: {}", self.url, js_error(&e)))?;
        let text = JsFuture::from(text)
            .await
            .map_err(|e| anyhow!("Failed to read {}: {}", self.url, js_error(&e)))?
            .as_string()
            .ok_or_else(|| anyhow!("Mappings body is not text"))?;

        MappingTable::from_json(&text).with_context(|| format!("Failed to parse {}", self.url))
    }
}

/// `window.localStorage` of the page origin
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn new(window: &Window) -> Result<Self> {
        let storage = window
            .local_storage()
            .map_err(|e| anyhow!("localStorage unavailable: {}", js_error(&e)))?
            .ok_or_else(|| anyhow!("localStorage unavailable"))?;
        Ok(Self { storage })
    }
}

#[async_trait(?Send)]
impl StateStorage for LocalStorage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| anyhow!("Failed to read {}: {}", key, js_error(&e)))
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| anyhow!("Failed to write {}: {}", key, js_error(&e)))
    }
}

/// Dispatches each notification as a `CustomEvent` for the toast widget
pub struct EventNotifier {
    window: Window,
}

impl EventNotifier {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Notifier for EventNotifier {
    fn notify(&self, notification: Notification) {
        let detail = match serde_wasm_bindgen::to_value(&notification) {
            Ok(detail) => detail,
            Err(e) => {
                warn!(error = %e, "Failed to encode notification");
                return;
            }
        };

        let init = CustomEventInit::new();
        init.set_detail(&detail);
        let dispatched = CustomEvent::new_with_event_init_dict(events::NOTIFY, &init)
            .and_then(|event| self.window.dispatch_event(&event));
        if let Err(e) = dispatched {
            warn!(error = %js_error(&e), "Failed to dispatch notification event");
        }
    }
}
