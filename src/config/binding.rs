//! Binding model: URL scope, key predicate and action descriptor
//!
//! Serializes to/from the mappings file format:
//! `{"url": "...", "key": {"char": "f", "shiftKey": true}, "action": {"type": "click", "selector": "..."}}`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key predicate of a binding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPredicate {
    /// Single character, compared case-insensitively
    #[serde(rename = "char")]
    pub character: String,

    /// Shift key must be held (true) or not held (false)
    #[serde(rename = "shiftKey", default)]
    pub shift_key: bool,
}

impl KeyPredicate {
    pub fn new(character: impl Into<String>, shift_key: bool) -> Self {
        Self {
            character: character.into(),
            shift_key,
        }
    }

    /// Get human-readable display name for this predicate (for notifications)
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();
        if self.shift_key {
            parts.push("Shift".to_string());
        }
        parts.push(self.character.to_uppercase());
        parts.join("+")
    }
}

impl fmt::Display for KeyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Kind of effect an action performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Focus,
    CopyTextContent,
    CopyValue,
    PasteValue,
    /// Runs the inline `js` payload in page context. No sandbox.
    CustomJs,
    Back,
    Forward,
    Refresh,
    RefreshNoCache,
    CloseTab,
    /// Any `type` this build does not know; always fails
    #[serde(other)]
    Unknown,
}

impl ActionKind {
    /// User-visible interaction with a matched target; worth a notification
    pub fn is_notify_worthy(self) -> bool {
        matches!(
            self,
            ActionKind::Click
                | ActionKind::Focus
                | ActionKind::CopyTextContent
                | ActionKind::CopyValue
                | ActionKind::PasteValue
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Focus => "focus",
            ActionKind::CopyTextContent => "copy_text_content",
            ActionKind::CopyValue => "copy_value",
            ActionKind::PasteValue => "paste_value",
            ActionKind::CustomJs => "custom_js",
            ActionKind::Back => "back",
            ActionKind::Forward => "forward",
            ActionKind::Refresh => "refresh",
            ActionKind::RefreshNoCache => "refresh_no_cache",
            ActionKind::CloseTab => "close_tab",
            ActionKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declarative action of a binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub kind: ActionKind,

    /// CSS selector of the target element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    /// Inline code for `custom_js`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js: Option<String>,
}

impl ActionDescriptor {
    /// Create an element-targeting action
    pub fn targeting(kind: ActionKind, selector: impl Into<String>) -> Self {
        Self {
            kind,
            selector: Some(selector.into()),
            js: None,
        }
    }

    /// Create an action without a target (navigation, tab close)
    pub fn untargeted(kind: ActionKind) -> Self {
        Self {
            kind,
            selector: None,
            js: None,
        }
    }

    pub fn custom_js(js: impl Into<String>, selector: Option<String>) -> Self {
        Self {
            kind: ActionKind::CustomJs,
            selector,
            js: Some(js.into()),
        }
    }
}

/// One row of the mappings table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Regex source tested (unanchored) against the full page URL
    pub url: String,
    pub key: KeyPredicate,
    pub action: ActionDescriptor,
}

impl Binding {
    pub fn new(url: impl Into<String>, key: KeyPredicate, action: ActionDescriptor) -> Self {
        Self {
            url: url.into(),
            key,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(KeyPredicate::new("f", true).display_name(), "Shift+F");
        assert_eq!(KeyPredicate::new("g", false).display_name(), "G");
    }

    #[test]
    fn test_binding_deserialization() {
        let json = r##"{
            "url": "developer.mo",
            "key": {"char": "f", "shiftKey": true},
            "action": {"type": "click", "selector": "#try_it > a"}
        }"##;
        let binding: Binding = serde_json::from_str(json).unwrap();
        assert_eq!(binding.url, "developer.mo");
        assert_eq!(binding.key, KeyPredicate::new("f", true));
        assert_eq!(binding.action.kind, ActionKind::Click);
        assert_eq!(binding.action.selector.as_deref(), Some("#try_it > a"));
        assert_eq!(binding.action.js, None);
    }

    #[test]
    fn test_custom_js_payload() {
        let json = r#"{"type": "custom_js", "js": "console.log(1)"}"#;
        let action: ActionDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(action.kind, ActionKind::CustomJs);
        assert_eq!(action.js.as_deref(), Some("console.log(1)"));
        assert_eq!(action.selector, None);
    }

    #[test]
    fn test_unknown_action_kind() {
        let json = r#"{"type": "teleport", "selector": "body"}"#;
        let action: ActionDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(action.kind, ActionKind::Unknown);
        assert!(!action.kind.is_notify_worthy());
    }

    #[test]
    fn test_shift_key_defaults_to_false() {
        let key: KeyPredicate = serde_json::from_str(r#"{"char": "x"}"#).unwrap();
        assert!(!key.shift_key);
    }

    #[test]
    fn test_notify_worthy_kinds() {
        assert!(ActionKind::Click.is_notify_worthy());
        assert!(ActionKind::PasteValue.is_notify_worthy());
        assert!(!ActionKind::CustomJs.is_notify_worthy());
        assert!(!ActionKind::Back.is_notify_worthy());
        assert!(!ActionKind::CloseTab.is_notify_worthy());
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let action = ActionDescriptor::untargeted(ActionKind::RefreshNoCache);
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"type":"refresh_no_cache"}"#);
    }
}
