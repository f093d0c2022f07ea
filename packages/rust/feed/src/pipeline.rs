//! Extraction pipeline: locate cards, load more when short, extract in order.

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use adlib_shared::{Extraction, ExtractedRecord, Result, Shortfall, ShortfallReason, TargetSpec};

use crate::controller::ConvergenceController;
use crate::extractor::FieldExtractor;
use crate::locator::ItemLocator;
use crate::session::{DocumentSnapshot, PageSnapshotProvider, ScrollActuator, ScrollObserver};

/// Default cap on load-more rounds inside [`ExtractionPipeline::extract_top`].
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Drives locator + extractor over snapshots, asking the controller for more
/// cards a bounded number of times.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline<L, E> {
    controller: ConvergenceController<L>,
    extractor: E,
    target: TargetSpec,
    max_retries: u32,
}

impl<L: ItemLocator, E: FieldExtractor> ExtractionPipeline<L, E> {
    /// `target` supplies pacing and timeout; its requested count is replaced
    /// per call by `extract_top(n)`.
    pub fn new(locator: L, extractor: E, target: TargetSpec) -> Self {
        Self {
            controller: ConvergenceController::new(locator),
            extractor,
            target,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Extract the first `n` cards in document order.
    ///
    /// `target.timeout` bounds the whole call: every load-more round gets
    /// only the time left before the deadline. Falls short only with an
    /// explicit [`Shortfall`]: either the deadline passed or `max_retries`
    /// load-more rounds were spent.
    #[instrument(skip_all, fields(n = n))]
    pub async fn extract_top<S, O>(
        &self,
        session: &mut S,
        n: usize,
        observer: &O,
    ) -> Result<Extraction>
    where
        S: PageSnapshotProvider + ScrollActuator + ?Sized,
        O: ScrollObserver + ?Sized,
    {
        let deadline = Instant::now() + self.target.timeout;
        let mut snapshot = session.current_snapshot().await?;
        let mut located = self.controller.count_located(&snapshot);
        let mut retries_left = self.max_retries;
        let mut reason = None;

        while located < n {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                reason = Some(ShortfallReason::Timeout);
                break;
            }
            if retries_left == 0 {
                reason = Some(ShortfallReason::RetryBudgetExhausted);
                break;
            }
            retries_left -= 1;

            debug!(
                located,
                retries_left,
                remaining_ms = remaining.as_millis(),
                "too few cards, loading more"
            );
            let round = TargetSpec {
                requested_count: n,
                timeout: remaining,
                ..self.target.clone()
            };
            let outcome = self.controller.ensure_loaded(session, &round, observer).await?;

            snapshot = session.current_snapshot().await?;
            located = self.controller.count_located(&snapshot);

            if outcome.timed_out && located < n {
                reason = Some(ShortfallReason::Timeout);
                break;
            }
        }

        let records = self.extract_records(&snapshot, n);
        let shortfall = reason.map(|reason| Shortfall {
            requested: n,
            located,
            reason,
        });

        match &shortfall {
            Some(s) => warn!(
                requested = n,
                located,
                reason = %s.reason,
                "returning partial extraction"
            ),
            None => info!(records = records.len(), "extraction complete"),
        }

        Ok(Extraction { records, shortfall })
    }

    /// Extract up to `n` cards from one snapshot, assigning ordinals from 1.
    pub fn extract_records(&self, snapshot: &DocumentSnapshot, n: usize) -> Vec<ExtractedRecord> {
        let doc = snapshot.parse();
        self.controller
            .locator()
            .locate(&doc)
            .iter()
            .take(n)
            .enumerate()
            .map(|(i, item)| ExtractedRecord::new(i + 1, self.extractor.extract(item)))
            .collect()
    }
}
