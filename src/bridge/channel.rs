//! In-process background context
//!
//! `ChannelBridge` is the page side: every request travels over an unbounded
//! channel together with the sender's tab id and a oneshot reply slot.
//! `BackgroundService` is the privileged side answering from a `TabHost`.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::{
    BackgroundBridge, BridgeError, BridgeRequest, BridgeResponse, RemoveTabResponse, TabId,
    TabInfo, TabResponse,
};

/// A request in flight, tagged with the sending tab like the extension runtime does
#[derive(Debug)]
pub struct BridgeEnvelope {
    pub sender: Option<TabId>,
    pub request: BridgeRequest,
    pub reply: oneshot::Sender<BridgeResponse>,
}

/// Page-side bridge over a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelBridge {
    tx: mpsc::UnboundedSender<BridgeEnvelope>,
    sender: Option<TabId>,
}

impl ChannelBridge {
    pub fn new(tx: mpsc::UnboundedSender<BridgeEnvelope>, sender: Option<TabId>) -> Self {
        Self { tx, sender }
    }

    /// Bridge plus the receiving end to hand to a `BackgroundService`
    pub fn channel(sender: Option<TabId>) -> (Self, mpsc::UnboundedReceiver<BridgeEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, sender), rx)
    }
}

#[async_trait(?Send)]
impl BackgroundBridge for ChannelBridge {
    async fn request(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(BridgeEnvelope {
                sender: self.sender,
                request,
                reply,
            })
            .map_err(|_| BridgeError::Disconnected)?;
        response.await.map_err(|_| BridgeError::Disconnected)
    }
}

/// Tab operations available to the background context
pub trait TabHost {
    /// Active tab of the current window
    fn active_tab(&mut self) -> Option<TabInfo>;

    /// Close a tab; false if it does not exist
    fn remove_tab(&mut self, id: TabId) -> bool;
}

/// Answers bridge requests from page contexts
pub struct BackgroundService<H> {
    host: H,
}

impl<H: TabHost> BackgroundService<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn handle(&mut self, sender: Option<TabId>, request: BridgeRequest) -> BridgeResponse {
        match request {
            BridgeRequest::GetCurrentTabId => {
                let tab = self.host.active_tab();
                debug!(tab = ?tab.as_ref().and_then(|t| t.id), "Answering current tab query");
                BridgeResponse::Tab(TabResponse { tab })
            }
            BridgeRequest::RemoveTab => {
                let success = match sender {
                    Some(id) => self.host.remove_tab(id),
                    None => {
                        warn!("removeTab request without a sender tab");
                        false
                    }
                };
                info!(tab = ?sender, success = success, "Removed sender tab");
                BridgeResponse::Removed(RemoveTabResponse { success })
            }
        }
    }

    /// Serve until every `ChannelBridge` is dropped, then hand the host back
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<BridgeEnvelope>) -> H {
        while let Some(envelope) = rx.recv().await {
            let response = self.handle(envelope.sender, envelope.request);
            if envelope.reply.send(response).is_err() {
                debug!("Bridge caller went away before the response");
            }
        }
        self.host
    }
}

/// Tab list kept in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryTabs {
    tabs: Vec<TabInfo>,
    active: Option<TabId>,
    removed: Vec<TabId>,
}

impl MemoryTabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tab and make it the active one
    pub fn open(mut self, tab: TabInfo) -> Self {
        self.active = tab.id;
        self.tabs.push(tab);
        self
    }

    pub fn tabs(&self) -> &[TabInfo] {
        &self.tabs
    }

    pub fn removed(&self) -> &[TabId] {
        &self.removed
    }
}

impl TabHost for MemoryTabs {
    fn active_tab(&mut self) -> Option<TabInfo> {
        let active = self.active?;
        self.tabs.iter().find(|t| t.id == Some(active)).cloned()
    }

    fn remove_tab(&mut self, id: TabId) -> bool {
        let before = self.tabs.len();
        self.tabs.retain(|t| t.id != Some(id));
        if self.tabs.len() == before {
            return false;
        }
        self.removed.push(id);
        if self.active == Some(id) {
            self.active = self.tabs.last().and_then(|t| t.id);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tabs() -> MemoryTabs {
        MemoryTabs::new()
            .open(TabInfo::new(1, "https://one.test/"))
            .open(TabInfo::new(2, "https://two.test/"))
    }

    #[test]
    fn test_handle_current_tab() {
        let mut service = BackgroundService::new(two_tabs());
        let response = service.handle(Some(1), BridgeRequest::GetCurrentTabId);
        assert_eq!(
            response,
            BridgeResponse::Tab(TabResponse {
                tab: Some(TabInfo::new(2, "https://two.test/"))
            })
        );
    }

    #[test]
    fn test_handle_remove_without_sender() {
        let mut service = BackgroundService::new(two_tabs());
        let response = service.handle(None, BridgeRequest::RemoveTab);
        assert_eq!(
            response,
            BridgeResponse::Removed(RemoveTabResponse { success: false })
        );
    }

    #[tokio::test]
    async fn test_round_trip_removes_sender_tab() {
        let (bridge, rx) = ChannelBridge::channel(Some(1));
        let service = tokio::spawn(BackgroundService::new(two_tabs()).run(rx));

        let current = bridge.current_tab().await.unwrap();
        assert_eq!(current.and_then(|t| t.id), Some(2));
        assert!(bridge.remove_current_tab().await.unwrap());

        drop(bridge);
        let host = service.await.unwrap();
        assert_eq!(host.removed(), &[1]);
        assert_eq!(host.tabs().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnected_background() {
        let (bridge, rx) = ChannelBridge::channel(Some(1));
        drop(rx);
        assert_eq!(
            bridge.current_tab().await,
            Err(BridgeError::Disconnected)
        );
    }
}
