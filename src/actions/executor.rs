//! Action execution
//!
//! Performs one binding's action against the element its selector resolved
//! to. Effects are applied directly (DOM, clipboard, navigation, tab close);
//! nothing is queued. The outcome says whether it worked and whether the user
//! should be told.

use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bridge::{BackgroundBridge, BridgeError};
use crate::config::{ActionDescriptor, ActionKind};
use crate::page::{
    Capability, Clipboard, ClipboardError, CodeRunner, Document, Element, Navigator, ScratchGuard,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no element matches selector {selector:?}")]
    ElementNotFound { selector: Option<String> },
    #[error("element {element} has no {capability}")]
    ElementIncapable {
        element: String,
        capability: &'static str,
    },
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error("custom_js action without code")]
    MissingScript,
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("unknown action type")]
    UnknownKind,
}

/// Result of one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub result: Result<(), ActionError>,
}

impl ActionOutcome {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    /// Successful user-visible interaction with a matched target
    pub fn notify_worthy(&self) -> bool {
        self.success() && self.kind.is_notify_worthy()
    }
}

/// Executes actions through the page ports
pub struct ActionExecutor {
    document: Rc<dyn Document>,
    clipboard: Rc<dyn Clipboard>,
    navigator: Rc<dyn Navigator>,
    runner: Rc<dyn CodeRunner>,
    bridge: Rc<dyn BackgroundBridge>,
}

impl ActionExecutor {
    pub fn new(
        document: Rc<dyn Document>,
        clipboard: Rc<dyn Clipboard>,
        navigator: Rc<dyn Navigator>,
        runner: Rc<dyn CodeRunner>,
        bridge: Rc<dyn BackgroundBridge>,
    ) -> Self {
        Self {
            document,
            clipboard,
            navigator,
            runner,
            bridge,
        }
    }

    pub fn document(&self) -> &dyn Document {
        self.document.as_ref()
    }

    /// Resolve the action's target: first element matching its selector
    pub fn resolve(&self, action: &ActionDescriptor) -> Option<Rc<dyn Element>> {
        let selector = action.selector.as_deref()?;
        self.document.query_selector(selector)
    }

    pub async fn execute(
        &self,
        element: Option<&dyn Element>,
        action: &ActionDescriptor,
    ) -> ActionOutcome {
        let result = self.perform(element, action).await;

        match &result {
            Ok(()) => info!(
                action = %action.kind,
                target = ?element.map(|e| e.describe()),
                "Action executed"
            ),
            Err(e @ (ActionError::Clipboard(_) | ActionError::Bridge(_))) => {
                warn!(action = %action.kind, error = %e, "Action failed")
            }
            Err(e) => debug!(action = %action.kind, error = %e, "Action not applicable"),
        }

        ActionOutcome {
            kind: action.kind,
            result,
        }
    }

    async fn perform(
        &self,
        element: Option<&dyn Element>,
        action: &ActionDescriptor,
    ) -> Result<(), ActionError> {
        match action.kind {
            ActionKind::Click => {
                capable(element, action, Capability::Click)?.click();
                Ok(())
            }
            ActionKind::Focus => {
                capable(element, action, Capability::Focus)?.focus();
                Ok(())
            }
            ActionKind::CopyTextContent => {
                let element = present(element, action)?;
                let text = element
                    .text_content()
                    .ok_or_else(|| incapable(element, "text content"))?;
                self.copy_text(&text).await
            }
            ActionKind::CopyValue => {
                let element = present(element, action)?;
                let value = element.value().ok_or_else(|| incapable(element, "value"))?;
                self.copy_text(&value).await
            }
            ActionKind::PasteValue => {
                let element = capable(element, action, Capability::WriteValue)?;
                let text = self.clipboard.read_text().await?;
                element.set_value(&text);
                Ok(())
            }
            ActionKind::CustomJs => {
                let code = action.js.as_deref().ok_or(ActionError::MissingScript)?;
                // The script's own result is not inspected
                if let Err(e) = self.runner.run(code, element) {
                    warn!(error = %e, "custom_js raised an error");
                }
                Ok(())
            }
            ActionKind::Back => {
                self.navigator.back();
                Ok(())
            }
            ActionKind::Forward => {
                self.navigator.forward();
                Ok(())
            }
            ActionKind::Refresh => {
                self.navigator.reload(false);
                Ok(())
            }
            ActionKind::RefreshNoCache => {
                self.navigator.reload(true);
                Ok(())
            }
            ActionKind::CloseTab => {
                let tab = self.bridge.current_tab().await?;
                debug!(tab = ?tab.and_then(|t| t.id), "Closing current tab");
                if !self.bridge.remove_current_tab().await? {
                    warn!("Background context reported the tab was not removed");
                }
                Ok(())
            }
            ActionKind::Unknown => Err(ActionError::UnknownKind),
        }
    }

    /// Write to the clipboard, falling back to a selected hidden node and the
    /// document copy command when there is no direct clipboard access
    async fn copy_text(&self, text: &str) -> Result<(), ActionError> {
        match self.clipboard.write_text(text).await {
            Ok(()) => Ok(()),
            Err(ClipboardError::Unavailable) => {
                debug!("Clipboard API unavailable, copying through scratch node");
                let scratch = ScratchGuard::attach(self.document.as_ref(), text)
                    .ok_or(ClipboardError::Unavailable)?;
                if scratch.copy() {
                    Ok(())
                } else {
                    Err(ClipboardError::Unavailable.into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn present<'a>(
    element: Option<&'a dyn Element>,
    action: &ActionDescriptor,
) -> Result<&'a dyn Element, ActionError> {
    element.ok_or_else(|| ActionError::ElementNotFound {
        selector: action.selector.clone(),
    })
}

fn capable<'a>(
    element: Option<&'a dyn Element>,
    action: &ActionDescriptor,
    capability: Capability,
) -> Result<&'a dyn Element, ActionError> {
    let element = present(element, action)?;
    if element.supports(capability) {
        Ok(element)
    } else {
        Err(incapable(element, capability.name()))
    }
}

fn incapable(element: &dyn Element, capability: &'static str) -> ActionError {
    ActionError::ElementIncapable {
        element: element.describe(),
        capability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ChannelBridge;
    use crate::page::{MemoryClipboard, MemoryDocument, NavigationCall};
    use crate::testing::PageHarness;

    fn harness() -> PageHarness {
        PageHarness::new(
            "https://example.test/form",
            r#"<p id="greeting">hello</p>
               <input id="name" value="Ada">
               <button id="go">Go</button>
               <svg id="icon"></svg>"#,
        )
    }

    async fn run(harness: &PageHarness, action: ActionDescriptor) -> ActionOutcome {
        let executor = harness.executor();
        let element = executor.resolve(&action);
        executor.execute(element.as_deref(), &action).await
    }

    #[tokio::test]
    async fn test_click() {
        let h = harness();
        let outcome = run(&h, ActionDescriptor::targeting(ActionKind::Click, "#go")).await;
        assert!(outcome.success());
        assert!(outcome.notify_worthy());
        assert_eq!(h.document.click_count("#go"), 1);
    }

    #[tokio::test]
    async fn test_click_incapable_element() {
        let h = harness();
        let outcome = run(&h, ActionDescriptor::targeting(ActionKind::Click, "#icon")).await;
        assert!(!outcome.success());
        assert!(!outcome.notify_worthy());
        assert!(matches!(
            outcome.result,
            Err(ActionError::ElementIncapable { capability: "click", .. })
        ));
        assert_eq!(h.document.total_clicks(), 0);
    }

    #[tokio::test]
    async fn test_missing_element() {
        let h = harness();
        let outcome = run(&h, ActionDescriptor::targeting(ActionKind::Focus, "#nope")).await;
        assert_eq!(
            outcome.result,
            Err(ActionError::ElementNotFound {
                selector: Some("#nope".to_string())
            })
        );
    }

    #[tokio::test]
    async fn test_focus() {
        let h = harness();
        let outcome = run(&h, ActionDescriptor::targeting(ActionKind::Focus, "#name")).await;
        assert!(outcome.notify_worthy());
        assert_eq!(h.document.focused().as_deref(), Some("input#name"));
    }

    #[tokio::test]
    async fn test_copy_text_content() {
        let h = harness();
        let outcome = run(
            &h,
            ActionDescriptor::targeting(ActionKind::CopyTextContent, "#greeting"),
        )
        .await;
        assert!(outcome.success());
        assert_eq!(h.clipboard.contents().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_copy_value_through_scratch_fallback() {
        let h = harness().without_clipboard_api();
        let outcome = run(&h, ActionDescriptor::targeting(ActionKind::CopyValue, "#name")).await;
        assert!(outcome.success());
        assert_eq!(h.clipboard.contents().as_deref(), Some("Ada"));
        assert_eq!(h.document.scratch_count(), 0);
    }

    #[tokio::test]
    async fn test_copy_fallback_failure_detaches_scratch() {
        let h = harness();
        // No clipboard API and a document whose copy command goes nowhere
        let document = Rc::new(MemoryDocument::new(
            "https://example.test/form",
            r#"<input id="name" value="Ada">"#,
        ));
        let clipboard = Rc::new(MemoryClipboard::new().without_direct_access());
        let (bridge, _rx) = ChannelBridge::channel(None);
        let executor = ActionExecutor::new(
            document.clone(),
            clipboard.clone(),
            h.navigator.clone(),
            h.runner.clone(),
            Rc::new(bridge),
        );

        let action = ActionDescriptor::targeting(ActionKind::CopyValue, "#name");
        let element = executor.resolve(&action);
        let outcome = executor.execute(element.as_deref(), &action).await;

        assert_eq!(
            outcome.result,
            Err(ActionError::Clipboard(ClipboardError::Unavailable))
        );
        assert!(!outcome.notify_worthy());
        assert_eq!(document.scratch_count(), 0);
        assert_eq!(clipboard.contents(), None);
    }

    #[tokio::test]
    async fn test_copy_value_without_value_field() {
        let h = harness();
        let outcome = run(&h, ActionDescriptor::targeting(ActionKind::CopyValue, "#greeting")).await;
        assert!(matches!(
            outcome.result,
            Err(ActionError::ElementIncapable { capability: "value", .. })
        ));
        assert_eq!(h.clipboard.contents(), None);
    }

    #[tokio::test]
    async fn test_paste_value() {
        let h = harness();
        h.clipboard.store("Grace");
        let outcome = run(&h, ActionDescriptor::targeting(ActionKind::PasteValue, "#name")).await;
        assert!(outcome.notify_worthy());
        assert_eq!(h.document.value_of("#name").as_deref(), Some("Grace"));
    }

    #[tokio::test]
    async fn test_paste_value_denied() {
        let h = harness();
        h.clipboard.store("Grace");
        h.clipboard.deny_reads(true);
        let outcome = run(&h, ActionDescriptor::targeting(ActionKind::PasteValue, "#name")).await;
        assert!(matches!(
            outcome.result,
            Err(ActionError::Clipboard(ClipboardError::Denied(_)))
        ));
        assert_eq!(h.document.value_of("#name").as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_custom_js_runs_code() {
        let h = harness();
        let outcome = run(&h, ActionDescriptor::custom_js("window.scrollTo(0, 0)", None)).await;
        assert!(outcome.success());
        assert!(!outcome.notify_worthy());
        assert_eq!(h.runner.scripts(), vec!["window.scrollTo(0, 0)".to_string()]);
    }

    #[tokio::test]
    async fn test_custom_js_without_code() {
        let h = harness();
        let outcome = run(&h, ActionDescriptor::untargeted(ActionKind::CustomJs)).await;
        assert_eq!(outcome.result, Err(ActionError::MissingScript));
    }

    #[tokio::test]
    async fn test_navigation_actions() {
        let h = harness();
        for kind in [
            ActionKind::Back,
            ActionKind::Forward,
            ActionKind::Refresh,
            ActionKind::RefreshNoCache,
        ] {
            let outcome = run(&h, ActionDescriptor::untargeted(kind)).await;
            assert!(outcome.success());
            assert!(!outcome.notify_worthy());
        }
        assert_eq!(
            h.navigator.calls(),
            vec![
                NavigationCall::Back,
                NavigationCall::Forward,
                NavigationCall::Reload {
                    bypass_cache: false
                },
                NavigationCall::Reload { bypass_cache: true },
            ]
        );
    }

    #[tokio::test]
    async fn test_close_tab() {
        let h = harness();
        let outcome = run(&h, ActionDescriptor::untargeted(ActionKind::CloseTab)).await;
        assert!(outcome.success());
        assert!(!outcome.notify_worthy());

        let tabs = h.shutdown_background().await;
        assert_eq!(tabs.removed(), &[PageHarness::TAB_ID]);
    }

    #[tokio::test]
    async fn test_close_tab_background_gone() {
        let h = harness();
        h.shutdown_background().await;
        let outcome = run(&h, ActionDescriptor::untargeted(ActionKind::CloseTab)).await;
        assert_eq!(
            outcome.result,
            Err(ActionError::Bridge(BridgeError::Disconnected))
        );
    }

    #[tokio::test]
    async fn test_unknown_kind() {
        let h = harness();
        let outcome = run(&h, ActionDescriptor::targeting(ActionKind::Unknown, "#go")).await;
        assert_eq!(outcome.result, Err(ActionError::UnknownKind));
        assert_eq!(h.document.total_clicks(), 0);
    }
}
