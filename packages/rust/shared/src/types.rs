//! Core domain types for the scroll-and-extract run.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;

/// Identifier recorded when neither extraction strategy matched.
pub const UNRESOLVED_ID: &str = "N/A";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one search run (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ExtractedRecord
// ---------------------------------------------------------------------------

/// One extracted result card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    ordinal: usize,
    identifier: String,
}

impl ExtractedRecord {
    /// `ordinal` is 1-based and assigned in document order.
    pub fn new(ordinal: usize, identifier: impl Into<String>) -> Self {
        debug_assert!(ordinal >= 1, "ordinals start at 1");
        Self {
            ordinal,
            identifier: identifier.into(),
        }
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whether extraction fell through to the [`UNRESOLVED_ID`] sentinel.
    pub fn is_resolved(&self) -> bool {
        self.identifier != UNRESOLVED_ID
    }
}

// ---------------------------------------------------------------------------
// TargetSpec
// ---------------------------------------------------------------------------

/// What one run is asked to load. Immutable for the duration of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Number of cards the caller wants.
    pub requested_count: usize,
    /// Assumed cards newly revealed per scroll.
    pub per_scroll_yield: usize,
    /// Overall time budget for loading.
    pub timeout: Duration,
    /// Wait after each scroll before the next step.
    pub settle_interval: Duration,
}

impl TargetSpec {
    /// Build a target from config defaults; `requested` overrides the configured count.
    pub fn from_config(config: &AppConfig, requested: Option<usize>) -> Self {
        Self {
            requested_count: requested.unwrap_or(config.defaults.requested_count),
            per_scroll_yield: config.scroll.per_scroll_yield,
            timeout: Duration::from_secs(config.defaults.timeout_secs),
            settle_interval: Duration::from_millis(config.scroll.settle_ms),
        }
    }
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self::from_config(&AppConfig::default(), None)
    }
}

// ---------------------------------------------------------------------------
// ScrollState
// ---------------------------------------------------------------------------

/// Mutable bookkeeping of one convergence pass. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub elapsed: Duration,
    pub scrolls_performed: usize,
    pub last_observed_count: usize,
    pub remaining_scroll_budget: usize,
}

// ---------------------------------------------------------------------------
// Partial results
// ---------------------------------------------------------------------------

/// Why an extraction ended below the requested count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallReason {
    /// The overall time budget ran out while scrolling.
    Timeout,
    /// Every load-more round was spent without reaching the target.
    RetryBudgetExhausted,
}

impl std::fmt::Display for ShortfallReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("timed out"),
            Self::RetryBudgetExhausted => f.write_str("retry budget exhausted"),
        }
    }
}

/// Explicit marker that a result is partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub requested: usize,
    pub located: usize,
    pub reason: ShortfallReason,
}

impl Shortfall {
    /// Cards still missing.
    pub fn missing(&self) -> usize {
        self.requested.saturating_sub(self.located)
    }
}

/// Outcome of `extract_top`: ordinal-ordered records and an optional shortfall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<ExtractedRecord>,
    pub shortfall: Option<Shortfall>,
}

impl Extraction {
    pub fn is_partial(&self) -> bool {
        self.shortfall.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_display_roundtrip() {
        let id = RunId::new();
        let parsed: Uuid = id.to_string().parse().unwrap();
        assert_eq!(parsed, id.0);
    }

    #[test]
    fn sentinel_record_is_unresolved() {
        assert!(!ExtractedRecord::new(1, UNRESOLVED_ID).is_resolved());
        assert!(ExtractedRecord::new(2, "123456789012345").is_resolved());
    }

    #[test]
    fn target_from_config_uses_override() {
        let config = AppConfig::default();
        let target = TargetSpec::from_config(&config, Some(40));
        assert_eq!(target.requested_count, 40);
        assert_eq!(target.per_scroll_yield, 15);
        assert_eq!(target.timeout, Duration::from_secs(300));
        assert_eq!(target.settle_interval, Duration::from_millis(600));

        let fallback = TargetSpec::from_config(&config, None);
        assert_eq!(fallback.requested_count, 5);
    }

    #[test]
    fn shortfall_missing_saturates() {
        let s = Shortfall {
            requested: 5,
            located: 3,
            reason: ShortfallReason::Timeout,
        };
        assert_eq!(s.missing(), 2);

        let over = Shortfall { located: 9, ..s };
        assert_eq!(over.missing(), 0);
    }
}
