//! Observed keyboard events
//!
//! Mirrors the two fields of a DOM `KeyboardEvent` the engine looks at. Other
//! modifiers are deliberately absent: Ctrl+F and F are the same event here.

use std::fmt;
use std::str::FromStr;

/// A key-release event as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// DOM `key` value (e.g. "F", "f", "~", "Escape")
    pub key: String,

    /// Shift key held
    pub shift_key: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, shift_key: bool) -> Self {
        Self {
            key: key.into(),
            shift_key,
        }
    }

    /// Human-readable name (e.g. "Shift+F")
    pub fn display_name(&self) -> String {
        if self.shift_key {
            format!("Shift+{}", self.key)
        } else {
            self.key.clone()
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Parses the CLI notation: `[Shift+]<key>`
impl FromStr for KeyEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty key".to_string());
        }

        // "Shift+" alone would leave no key; a bare "+" is the plus key
        match s.split_once('+') {
            Some((modifier, key)) if !modifier.is_empty() && !key.is_empty() => {
                if modifier.eq_ignore_ascii_case("shift") {
                    Ok(Self::new(key, true))
                } else {
                    Err(format!("Unsupported modifier '{}' (only Shift is modeled)", modifier))
                }
            }
            _ => Ok(Self::new(s, false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(KeyEvent::new("F", true).display_name(), "Shift+F");
        assert_eq!(KeyEvent::new("Escape", false).display_name(), "Escape");
    }

    #[test]
    fn test_parse() {
        assert_eq!("Shift+F".parse::<KeyEvent>().unwrap(), KeyEvent::new("F", true));
        assert_eq!("shift+~".parse::<KeyEvent>().unwrap(), KeyEvent::new("~", true));
        assert_eq!("Escape".parse::<KeyEvent>().unwrap(), KeyEvent::new("Escape", false));
        assert_eq!("+".parse::<KeyEvent>().unwrap(), KeyEvent::new("+", false));
    }

    #[test]
    fn test_parse_rejects_other_modifiers() {
        assert!("Ctrl+F".parse::<KeyEvent>().is_err());
        assert!("".parse::<KeyEvent>().is_err());
    }
}
