//! Field sanitization.
//!
//! Stores bind names as query parameters, so sanitization is not what keeps
//! queries safe. It still normalizes display text and keeps node names stable
//! across runs: the same messy input always maps to the same node.

use regex::Regex;
use std::sync::OnceLock;

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex"))
}

fn relation_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+$").expect("static regex"))
}

fn whitespace_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Strip quotes and punctuation, keeping letters, digits, underscores and
/// whitespace.
///
/// Trimming happens last, so `sanitize_text(sanitize_text(x)) == sanitize_text(x)`.
pub fn sanitize_text(text: &str) -> String {
    let without_quotes: String = text.chars().filter(|c| *c != '\'' && *c != '"').collect();
    let cleaned = non_word_re().replace_all(&without_quotes, "");
    cleaned.trim().to_string()
}

/// Sanitize a relation label into a relationship-type identifier.
///
/// Internal whitespace runs become `_` (`IS BETTER THAN` → `IS_BETTER_THAN`);
/// the result contains only word characters.
pub fn normalize_relation_type(label: &str) -> String {
    let cleaned = sanitize_text(label);
    whitespace_run_re().replace_all(&cleaned, "_").into_owned()
}

/// `true` when `s` is usable as a relationship type without quoting issues.
pub fn is_valid_relation_type(s: &str) -> bool {
    relation_type_re().is_match(s)
}
