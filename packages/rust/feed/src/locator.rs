//! Item locator: finds the rendered result cards in a snapshot.
//!
//! Cards are matched in two levels: first the results region, then the card
//! shape inside it. The card selector alone over-matches unrelated fragments
//! elsewhere on the page.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use adlib_shared::{AdLibError, Result, SelectorsConfig};

/// Opaque handle to one rendered card.
///
/// Borrows the parsed snapshot it came from, so handles cannot outlive a
/// re-snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ResultItem<'a> {
    element: ElementRef<'a>,
}

impl<'a> ResultItem<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Visible text, one space between text nodes.
    pub fn text(&self) -> String {
        self.element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Returns the ordered result cards currently rendered in a document.
pub trait ItemLocator: Send + Sync {
    /// Cards in document order. Empty (never an error) when the region is absent.
    fn locate<'a>(&self, doc: &'a Html) -> Vec<ResultItem<'a>>;
}

/// [`ItemLocator`] driven by a region selector and a card selector.
#[derive(Debug, Clone)]
pub struct SelectorLocator {
    region: Selector,
    card: Selector,
}

impl SelectorLocator {
    /// Compile both selectors up front; invalid strings are a config error.
    pub fn new(region: &str, card: &str) -> Result<Self> {
        Ok(Self {
            region: compile_selector(region)?,
            card: compile_selector(card)?,
        })
    }

    pub fn from_config(selectors: &SelectorsConfig) -> Result<Self> {
        Self::new(&selectors.results_region, &selectors.card)
    }
}

impl ItemLocator for SelectorLocator {
    fn locate<'a>(&self, doc: &'a Html) -> Vec<ResultItem<'a>> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut regions = 0usize;

        for region in doc.select(&self.region) {
            regions += 1;
            for card in region.select(&self.card) {
                // Nested regions revisit cards; nested cards belong to their outer card.
                let fresh = seen.insert(card.id());
                if !fresh || card.ancestors().any(|a| seen.contains(&a.id())) {
                    continue;
                }
                items.push(ResultItem::new(card));
            }
        }

        if regions == 0 {
            debug!("results region not rendered yet");
        }
        items
    }
}

/// Compile a CSS selector, rejecting empty or malformed strings as config errors.
pub fn compile_selector(selector: &str) -> Result<Selector> {
    if selector.trim().is_empty() {
        return Err(AdLibError::config("selector must not be empty"));
    }
    Selector::parse(selector)
        .map_err(|e| AdLibError::config(format!("invalid selector `{selector}`: {e:?}")))
}
