//! Field extractor: pulls the Library ID out of one result card.
//!
//! Strategies run in order, first match wins:
//! 1. the labelled form `Library ID: <digits>`
//! 2. any standalone run of 14–16 digits
//!
//! Anything else resolves to [`UNRESOLVED_ID`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use adlib_shared::UNRESOLVED_ID;

use crate::locator::ResultItem;

static LABELLED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Library ID:\s*([0-9]+)").expect("valid regex"));

static BARE_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{14,16})(?:[^0-9]|$)").expect("valid regex")
});

/// Returns the identifier of one card.
pub trait FieldExtractor: Send + Sync {
    /// Never fails; unresolvable cards yield the sentinel.
    fn extract(&self, item: &ResultItem<'_>) -> String;
}

/// Labelled pattern first, bare digit run as fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryIdExtractor;

impl LibraryIdExtractor {
    /// Apply both strategies to plain text.
    pub fn extract_from_text(text: &str) -> Option<&str> {
        LABELLED_RE
            .captures(text)
            .or_else(|| BARE_DIGITS_RE.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl FieldExtractor for LibraryIdExtractor {
    fn extract(&self, item: &ResultItem<'_>) -> String {
        let text = item.text();
        match Self::extract_from_text(&text) {
            Some(id) => id.to_string(),
            None => {
                let snippet: String = text.chars().take(80).collect();
                debug!(%snippet, "no library id in card");
                UNRESOLVED_ID.to_string()
            }
        }
    }
}
