//! Mappings file and the loaded binding table
//!
//! A `MappingTable` is the immutable snapshot handed to one dispatch cycle.
//! URL patterns are compiled once per load; a pattern that fails to compile
//! keeps its error in place so it only surfaces when matching reaches it.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::binding::Binding;
use crate::input::matcher::compile_url_pattern;

/// On-disk / packaged format: `{"mappings": [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub mappings: Vec<Binding>,
}

/// A binding together with its compiled URL pattern
#[derive(Debug, Clone)]
pub struct CompiledBinding {
    pub binding: Binding,
    pattern: Result<Regex, regex::Error>,
}

impl CompiledBinding {
    pub fn new(binding: Binding) -> Self {
        let pattern = compile_url_pattern(&binding.url);
        Self { binding, pattern }
    }

    /// Test the URL scope against the full page URL
    pub fn matches_url(&self, url: &str) -> Result<bool, regex::Error> {
        match &self.pattern {
            Ok(regex) => Ok(regex.is_match(url)),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Ordered, immutable binding list (first match wins)
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    bindings: Vec<CompiledBinding>,
}

impl MappingTable {
    pub fn new(bindings: Vec<Binding>) -> Self {
        Self {
            bindings: bindings.into_iter().map(CompiledBinding::new).collect(),
        }
    }

    /// Parse the mappings file format
    pub fn from_json(json: &str) -> Result<Self> {
        let file: MappingFile =
            serde_json::from_str(json).context("Failed to parse mappings JSON")?;
        Ok(Self::from(file))
    }

    pub fn bindings(&self) -> &[CompiledBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl From<MappingFile> for MappingTable {
    fn from(file: MappingFile) -> Self {
        Self::new(file.mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActionDescriptor, ActionKind, KeyPredicate};

    #[test]
    fn test_from_json_preserves_order() {
        let json = r##"{"mappings": [
            {"url": "a", "key": {"char": "x", "shiftKey": false}, "action": {"type": "click", "selector": "#one"}},
            {"url": "b", "key": {"char": "y", "shiftKey": true}, "action": {"type": "back"}}
        ]}"##;
        let table = MappingTable::from_json(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.bindings()[0].binding.url, "a");
        assert_eq!(table.bindings()[1].binding.action.kind, ActionKind::Back);
    }

    #[test]
    fn test_missing_mappings_is_empty_table() {
        let table = MappingTable::from_json("{}").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(MappingTable::from_json("{\"mappings\": [").is_err());
    }

    #[test]
    fn test_invalid_pattern_is_kept_until_matched() {
        let table = MappingTable::new(vec![Binding::new(
            "([",
            KeyPredicate::new("x", false),
            ActionDescriptor::untargeted(ActionKind::Back),
        )]);
        assert_eq!(table.len(), 1);
        assert!(table.bindings()[0].matches_url("https://example.com").is_err());
    }

    #[test]
    fn test_compiled_pattern_matches() {
        let compiled = CompiledBinding::new(Binding::new(
            "developer\\.mo",
            KeyPredicate::new("f", true),
            ActionDescriptor::targeting(ActionKind::Click, "#try_it > a"),
        ));
        assert!(compiled.matches_url("https://developer.mo/x").unwrap());
        assert!(!compiled.matches_url("https://example.com").unwrap());
    }
}
