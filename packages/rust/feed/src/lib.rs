//! Infinite-scroll feed loading and result-card extraction.
//!
//! This crate provides:
//! - [`session`] — capabilities the core needs from a browsing session
//! - [`locator`] — two-level (region, card) result-card location
//! - [`extractor`] — Library ID extraction with a digit-run fallback
//! - [`controller`] — the scroll-until-converged loop
//! - [`pipeline`] — bounded load-more retries and ordinal assignment
//! - [`replay`] — offline session over saved page captures
//! - `chrome` (feature `chrome`) — headless Chrome session

pub mod controller;
pub mod extractor;
pub mod locator;
pub mod pipeline;
pub mod replay;
pub mod session;

#[cfg(feature = "chrome")]
pub mod chrome;

#[cfg(test)]
mod testing;

pub use controller::{ConvergenceController, LoadOutcome, scroll_budget};
pub use extractor::{FieldExtractor, LibraryIdExtractor};
pub use locator::{ItemLocator, ResultItem, SelectorLocator, compile_selector};
pub use pipeline::{DEFAULT_MAX_RETRIES, ExtractionPipeline};
pub use replay::ReplaySession;
pub use session::{
    BrowserSession, DocumentSnapshot, PageSnapshotProvider, ScrollActuator, ScrollObserver,
};

#[cfg(feature = "chrome")]
pub use chrome::ChromeSession;
