//! Convergence controller: scrolls until enough cards have rendered.
//!
//! Rather than counting after every scroll, the controller estimates how many
//! scrolls the missing cards need (from the assumed per-scroll yield), spends
//! that budget, and only then snapshots and counts. A short count re-estimates
//! the budget from the remaining gap.

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use adlib_shared::{Result, ScrollState, TargetSpec};

use crate::locator::ItemLocator;
use crate::session::{DocumentSnapshot, PageSnapshotProvider, ScrollActuator, ScrollObserver};

/// Result of one [`ConvergenceController::ensure_loaded`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    /// The time budget ran out before the target count was seen.
    pub timed_out: bool,
    /// Final bookkeeping of the pass.
    pub state: ScrollState,
}

impl LoadOutcome {
    /// Card count at the last check.
    pub fn observed(&self) -> usize {
        self.state.last_observed_count
    }
}

/// Decides how far to scroll based on a moving target count.
#[derive(Debug, Clone)]
pub struct ConvergenceController<L> {
    locator: L,
}

impl<L: ItemLocator> ConvergenceController<L> {
    pub fn new(locator: L) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Count the cards in a snapshot.
    pub fn count_located(&self, snapshot: &DocumentSnapshot) -> usize {
        let doc = snapshot.parse();
        self.locator.locate(&doc).len()
    }

    /// Scroll until `target.requested_count` cards are located or the timeout fires.
    ///
    /// A timeout is reported through [`LoadOutcome::timed_out`], never as an error.
    #[instrument(skip_all, fields(requested = target.requested_count))]
    pub async fn ensure_loaded<S, O>(
        &self,
        session: &mut S,
        target: &TargetSpec,
        observer: &O,
    ) -> Result<LoadOutcome>
    where
        S: PageSnapshotProvider + ScrollActuator + ?Sized,
        O: ScrollObserver + ?Sized,
    {
        let started = Instant::now();
        let mut state = ScrollState {
            remaining_scroll_budget: scroll_budget(
                target.requested_count,
                0,
                target.per_scroll_yield,
            ),
            ..ScrollState::default()
        };

        debug!(budget = state.remaining_scroll_budget, "starting convergence");

        while started.elapsed() < target.timeout {
            session.scroll_to_bottom().await?;
            tokio::time::sleep(target.settle_interval).await;
            state.scrolls_performed += 1;
            state.remaining_scroll_budget -= 1;

            if state.remaining_scroll_budget > 0 {
                continue;
            }

            let snapshot = session.current_snapshot().await?;
            state.last_observed_count = self.count_located(&snapshot);
            state.elapsed = started.elapsed();
            observer.checked(&state);

            if state.last_observed_count >= target.requested_count {
                info!(
                    located = state.last_observed_count,
                    scrolls = state.scrolls_performed,
                    elapsed_ms = state.elapsed.as_millis(),
                    "feed converged"
                );
                return Ok(LoadOutcome {
                    timed_out: false,
                    state,
                });
            }

            state.remaining_scroll_budget = scroll_budget(
                target.requested_count,
                state.last_observed_count,
                target.per_scroll_yield,
            );
            debug!(
                located = state.last_observed_count,
                budget = state.remaining_scroll_budget,
                "short of target, re-estimating"
            );
        }

        state.elapsed = started.elapsed();
        warn!(
            located = state.last_observed_count,
            scrolls = state.scrolls_performed,
            timeout_secs = target.timeout.as_secs(),
            "timed out before reaching requested count"
        );
        Ok(LoadOutcome {
            timed_out: true,
            state,
        })
    }
}

/// Scrolls needed to reveal the missing cards: `ceil(missing / yield)`, at least 1.
pub fn scroll_budget(requested: usize, located: usize, per_scroll_yield: usize) -> usize {
    let missing = requested.saturating_sub(located);
    missing.div_ceil(per_scroll_yield.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::locator::SelectorLocator;
    use crate::replay::ReplaySession;
    use crate::testing::{page_with_cards, target};

    fn controller() -> ConvergenceController<SelectorLocator> {
        ConvergenceController::new(SelectorLocator::new("div.results", "div.card").unwrap())
    }

    #[test]
    fn budget_rounds_up_and_floors_at_one() {
        assert_eq!(scroll_budget(5, 0, 15), 1);
        assert_eq!(scroll_budget(30, 0, 15), 2);
        assert_eq!(scroll_budget(31, 0, 15), 3);
        assert_eq!(scroll_budget(31, 20, 15), 1);
        assert_eq!(scroll_budget(0, 0, 15), 1);
        assert_eq!(scroll_budget(10, 50, 15), 1);
        assert_eq!(scroll_budget(4, 0, 0), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_requested_scrolls_once() {
        let mut session = ReplaySession::loaded(vec![page_with_cards(0, 0)]);
        let outcome = controller()
            .ensure_loaded(&mut session, &target(0, 15), &())
            .await
            .unwrap();

        assert!(!outcome.timed_out);
        assert_eq!(outcome.state.scrolls_performed, 1);
        assert_eq!(session.scrolls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn spends_whole_budget_before_counting() {
        // Frame i is shown after i scrolls; 30 cards need 2 scrolls at yield 15.
        let frames = vec![
            page_with_cards(0, 0),
            page_with_cards(0, 15),
            page_with_cards(0, 30),
        ];
        let mut session = ReplaySession::loaded(frames);
        let outcome = controller()
            .ensure_loaded(&mut session, &target(30, 15), &())
            .await
            .unwrap();

        assert!(!outcome.timed_out);
        assert_eq!(outcome.observed(), 30);
        assert_eq!(outcome.state.scrolls_performed, 2);
        assert_eq!(session.snapshots_taken(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn re_estimates_after_short_count() {
        // Yield is overestimated: each scroll reveals 3 cards, not 5.
        let frames = (0..=4).map(|i| page_with_cards(0, i * 3)).collect();
        let mut session = ReplaySession::loaded(frames);

        struct Counts(std::sync::Mutex<Vec<usize>>);
        impl ScrollObserver for Counts {
            fn checked(&self, state: &ScrollState) {
                self.0.lock().unwrap().push(state.last_observed_count);
            }
        }
        let counts = Counts(Default::default());

        let outcome = controller()
            .ensure_loaded(&mut session, &target(10, 5), &counts)
            .await
            .unwrap();

        // 2 scrolls -> 6 located, budget ceil(4/5)=1 -> 9, budget 1 -> 12.
        assert_eq!(*counts.0.lock().unwrap(), vec![6, 9, 12]);
        assert_eq!(outcome.observed(), 12);
        assert_eq!(outcome.state.scrolls_performed, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_partial_count() {
        let mut session = ReplaySession::loaded(vec![page_with_cards(0, 2)]);
        let mut pacing = target(10, 5);
        pacing.timeout = Duration::from_secs(5);
        pacing.settle_interval = Duration::from_secs(1);

        let outcome = controller()
            .ensure_loaded(&mut session, &pacing, &())
            .await
            .unwrap();

        assert!(outcome.timed_out);
        assert_eq!(outcome.observed(), 2);
        assert_eq!(outcome.state.scrolls_performed, 5);
        assert!(outcome.state.elapsed >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_never_scrolls() {
        let mut session = ReplaySession::loaded(vec![page_with_cards(0, 0)]);
        let mut pacing = target(3, 15);
        pacing.timeout = Duration::ZERO;

        let outcome = controller()
            .ensure_loaded(&mut session, &pacing, &())
            .await
            .unwrap();

        assert!(outcome.timed_out);
        assert_eq!(session.scrolls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_failure_propagates() {
        let mut session = ReplaySession::new(vec![page_with_cards(0, 1)]);
        let err = controller()
            .ensure_loaded(&mut session, &target(1, 15), &())
            .await
            .unwrap_err();
        assert!(matches!(err, adlib_shared::AdLibError::SnapshotUnavailable(_)));
    }
}
