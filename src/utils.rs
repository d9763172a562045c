//! Text helpers shared by the extractors and the logging around them.
//!
//! This module provides:
//! - Whitespace normalization for text pulled out of HTML
//! - String truncation for log previews

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run (including non-breaking spaces and
/// newlines) into a single space and trim both ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_text("  Prečo\n   je  "), "Prečo je");
/// ```
pub fn normalize_text(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").trim().to_string()
}

/// Like [`normalize_text`], but maps an empty result to `None`.
///
/// Used for optional landmarks, where an element that exists but holds only
/// whitespace counts as absent.
pub fn non_empty_text(s: &str) -> Option<String> {
    let text = normalize_text(s);
    if text.is_empty() { None } else { Some(text) }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary at or before `max`
/// bytes, with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
