//! Bridge to the privileged background context
//!
//! Content pages cannot touch tabs directly; they send a request message and
//! await a single response. Two requests exist:
//! - `{"action": "getCurrentTabId"}` answered with `{"tab": {...} | null}`
//! - `{"action": "removeTab"}` answered with `{"success": bool}`

pub mod channel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use channel::{BackgroundService, BridgeEnvelope, ChannelBridge, MemoryTabs, TabHost};

pub type TabId = i64;

/// Requests sent from the page to the background context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BridgeRequest {
    /// Active tab of the current window
    GetCurrentTabId,
    /// Close the tab that sent the request
    RemoveTab,
}

/// Subset of the browser's tab object the engine cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    #[serde(default)]
    pub id: Option<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TabInfo {
    pub fn new(id: TabId, url: &str) -> Self {
        Self {
            id: Some(id),
            url: Some(url.to_string()),
            title: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveTabResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabResponse {
    pub tab: Option<TabInfo>,
}

/// Responses from the background context
///
/// Untagged on the wire; `Removed` is tried first because `TabResponse`
/// would also accept an object without a `tab` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    Removed(RemoveTabResponse),
    Tab(TabResponse),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("background context is not reachable")]
    Disconnected,
    #[error("background context rejected the request: {0}")]
    Rejected(String),
    #[error("unexpected response from background context: {0}")]
    UnexpectedResponse(String),
}

/// Request/response channel into the background context
#[async_trait(?Send)]
pub trait BackgroundBridge {
    /// Single round trip, no retry
    async fn request(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError>;

    async fn current_tab(&self) -> Result<Option<TabInfo>, BridgeError> {
        match self.request(BridgeRequest::GetCurrentTabId).await? {
            BridgeResponse::Tab(response) => Ok(response.tab),
            other => Err(BridgeError::UnexpectedResponse(format!("{:?}", other))),
        }
    }

    /// Returns the background's `success` flag
    async fn remove_current_tab(&self) -> Result<bool, BridgeError> {
        match self.request(BridgeRequest::RemoveTab).await? {
            BridgeResponse::Removed(response) => Ok(response.success),
            other => Err(BridgeError::UnexpectedResponse(format!("{:?}", other))),
        }
    }
}
