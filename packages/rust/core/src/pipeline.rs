//! End-to-end `search` run: keyword → search page → scroll/extract → CSV.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};
use url::Url;

use adlib_feed::{
    BrowserSession, ExtractionPipeline, LibraryIdExtractor, ScrollObserver, SelectorLocator,
    compile_selector,
};
use adlib_shared::{
    AppConfig, ExtractedRecord, Result, RunId, SelectorsConfig, Shortfall, TargetSpec,
};

use crate::search::{self, heading_text, parse_total_results};
use crate::sink;

/// Configuration for one `run_search` call.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Keyword typed into the Ad Library search.
    pub keyword: String,
    /// Requested count, pacing and timeout.
    pub target: TargetSpec,
    /// Load-more rounds allowed when too few cards are present.
    pub max_retries: u32,
    /// Selector strings for region, card and results heading.
    pub selectors: SelectorsConfig,
    /// Search page the query is appended to.
    pub base_url: String,
    /// Polls for the results heading before extracting anyway.
    pub ready_attempts: u32,
    pub ready_poll_interval: Duration,
    /// Where to write the CSV; `None` skips writing.
    pub output: Option<PathBuf>,
}

impl RunConfig {
    /// Merge the config file with per-run values. `requested` and
    /// `timeout_secs` override the config when given.
    pub fn from_app_config(
        config: &AppConfig,
        keyword: impl Into<String>,
        requested: Option<usize>,
        timeout_secs: Option<u64>,
        output: Option<PathBuf>,
    ) -> Self {
        let mut target = TargetSpec::from_config(config, requested);
        if let Some(secs) = timeout_secs {
            target.timeout = Duration::from_secs(secs);
        }

        Self {
            keyword: keyword.into(),
            target,
            max_retries: config.scroll.max_retries,
            selectors: config.selectors.clone(),
            base_url: config.browser.base_url.clone(),
            ready_attempts: config.scroll.ready_attempts,
            ready_poll_interval: Duration::from_millis(config.scroll.ready_poll_ms),
            output,
        }
    }
}

/// Result of a `run_search` call.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: RunId,
    pub keyword: String,
    pub search_url: Url,
    /// Total reported by the results heading (0 if unavailable).
    pub total_results: usize,
    /// Ordinal-ordered records.
    pub records: Vec<ExtractedRecord>,
    /// Set when fewer than the requested cards were extracted.
    pub shortfall: Option<Shortfall>,
    /// The CSV written, if any.
    pub output_path: Option<PathBuf>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Records whose card carried no recognizable Library ID.
    pub fn unresolved(&self) -> usize {
        self.records.iter().filter(|r| !r.is_resolved()).count()
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: ScrollObserver + Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the run completes successfully.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ScrollObserver for SilentProgress {
    fn checked(&self, _state: &adlib_shared::ScrollState) {}
}

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run one keyword search against `session`.
///
/// The session is released before returning, whether the run succeeded or
/// failed. A release failure is logged and does not replace the run's result.
#[instrument(skip_all, fields(keyword = %config.keyword))]
pub async fn run_search<S>(
    config: &RunConfig,
    session: &mut S,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary>
where
    S: BrowserSession + ?Sized,
{
    let outcome = drive(config, session, progress).await;

    progress.phase("Closing browser session");
    if let Err(e) = session.release().await {
        warn!(error = %e, "failed to release browser session");
    }

    if let Ok(summary) = &outcome {
        progress.done(summary);
    }
    outcome
}

async fn drive<S>(
    config: &RunConfig,
    session: &mut S,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary>
where
    S: BrowserSession + ?Sized,
{
    let start = Instant::now();
    let run_id = RunId::new();

    // Compile everything before touching the page so bad config fails fast.
    let url = search::search_url(&config.base_url, &config.keyword)?;
    let heading = compile_selector(&config.selectors.results_heading)?;
    let pipeline = ExtractionPipeline::new(
        SelectorLocator::from_config(&config.selectors)?,
        LibraryIdExtractor,
        config.target.clone(),
    )
    .with_max_retries(config.max_retries);

    info!(%run_id, url = %url, requested = config.target.requested_count, "starting search run");

    // --- Phase 1: Navigate ---
    progress.phase("Opening search page");
    session.navigate(url.as_str()).await?;

    // --- Phase 2: Wait for results ---
    progress.phase("Waiting for results");
    let ready = search::wait_until_ready(
        &*session,
        &heading,
        config.ready_attempts,
        config.ready_poll_interval,
    )
    .await?;

    let total_results = match ready {
        Some(snapshot) => heading_text(&snapshot, &heading)
            .map(|text| parse_total_results(&text))
            .unwrap_or(0),
        None => {
            warn!(
                attempts = config.ready_attempts,
                "results heading never rendered, extracting anyway"
            );
            0
        }
    };
    info!(total_results, keyword = %config.keyword, "search results reported");

    // --- Phase 3: Scroll and extract ---
    progress.phase("Loading result cards");
    let extraction = pipeline
        .extract_top(session, config.target.requested_count, progress)
        .await?;

    // --- Phase 4: Write output ---
    let output_path = match &config.output {
        Some(path) => {
            progress.phase("Writing CSV");
            sink::write_csv(path, &extraction.records)?;
            Some(path.clone())
        }
        None => None,
    };

    let summary = RunSummary {
        run_id,
        keyword: config.keyword.clone(),
        search_url: url,
        total_results,
        records: extraction.records,
        shortfall: extraction.shortfall,
        output_path,
        elapsed: start.elapsed(),
    };

    info!(
        %run_id,
        records = summary.records.len(),
        unresolved = summary.unresolved(),
        partial = summary.shortfall.is_some(),
        elapsed_ms = summary.elapsed.as_millis(),
        "search run finished"
    );

    Ok(summary)
}
