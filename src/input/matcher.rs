//! Key and URL matching
//!
//! Pure predicates used by the dispatcher to decide whether a binding applies
//! to the current event and page.
//!
//! URL patterns use the `regex` crate syntax, which has no lookaround and no
//! backreferences. Mappings written for JavaScript `RegExp` that rely on
//! either fail to compile, and the dispatch cycle that reaches them aborts.

use regex::Regex;

use super::event::KeyEvent;
use crate::config::KeyPredicate;

/// Check if an observed event satisfies a binding's key predicate
///
/// Shift must match exactly; the character comparison is case-insensitive.
pub fn matches_key(event: &KeyEvent, predicate: &KeyPredicate) -> bool {
    if event.shift_key != predicate.shift_key {
        return false;
    }
    event.key.to_lowercase() == predicate.character.to_lowercase()
}

/// Compile a URL scope pattern
///
/// Patterns are unanchored: "developer.mo" matches anywhere in the URL.
pub fn compile_url_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)
}

/// Compile `pattern` and test it against the full current URL
pub fn matches_url(pattern: &str, current_url: &str) -> Result<bool, regex::Error> {
    Ok(compile_url_pattern(pattern)?.is_match(current_url))
}
