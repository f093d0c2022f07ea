//! Browsing-session capabilities consumed by the scroll-and-extract core.
//!
//! The core never talks to a browser directly. It takes snapshots through
//! [`PageSnapshotProvider`] and advances the viewport through
//! [`ScrollActuator`]; a full [`BrowserSession`] adds navigation and release.

use async_trait::async_trait;
use scraper::Html;

use adlib_shared::{Result, ScrollState};

/// Point-in-time capture of the rendered document markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    markup: String,
}

impl DocumentSnapshot {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Parse the markup into a queryable document.
    ///
    /// The parsed tree is not `Send`; keep it out of `.await` points.
    pub fn parse(&self) -> Html {
        Html::parse_document(&self.markup)
    }
}

/// Supplies the current fully rendered document on demand.
#[async_trait]
pub trait PageSnapshotProvider: Send + Sync {
    /// Fails with `SnapshotUnavailable` when no page is loaded.
    async fn current_snapshot(&self) -> Result<DocumentSnapshot>;
}

/// Advances the rendered viewport so more items can load.
#[async_trait]
pub trait ScrollActuator: Send + Sync {
    /// Fire-and-forget; calling it repeatedly is harmless.
    async fn scroll_to_bottom(&mut self) -> Result<()>;
}

/// A browsing session owned by exactly one run.
///
/// Acquire it, navigate once, drive it through the pipeline, then call
/// [`release`](BrowserSession::release) on every exit path.
#[async_trait]
pub trait BrowserSession: PageSnapshotProvider + ScrollActuator {
    /// Load `url` in the session's page.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Tear down the session. Must be safe to call after a failed run.
    async fn release(&mut self) -> Result<()>;
}

/// Receives the scroll state every time the controller checks the count.
pub trait ScrollObserver {
    fn checked(&self, state: &ScrollState);
}

impl ScrollObserver for () {
    fn checked(&self, _state: &ScrollState) {}
}
