//! Run orchestration for adlib.
//!
//! This crate ties the feed components into one end-to-end search run
//! (`run_search`): open the search page, wait for results, load and extract
//! the requested cards, write the CSV, and always release the session.

pub mod pipeline;
pub mod search;
pub mod sink;

pub use pipeline::{ProgressReporter, RunConfig, RunSummary, SilentProgress, run_search};
pub use search::{parse_total_results, search_url};
pub use sink::{CSV_HEADER, render_csv, write_csv};
