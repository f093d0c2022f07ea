//! Fixtures shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use adlib_shared::{Result, TargetSpec};

use crate::session::{DocumentSnapshot, PageSnapshotProvider, ScrollActuator};

/// Library ID printed on card number `i`.
pub(crate) fn card_id(i: usize) -> String {
    (100_000_000_000_000u64 + i as u64).to_string()
}

/// A page whose results region holds `count` cards numbered from `first`.
pub(crate) fn page_with_cards(first: usize, count: usize) -> String {
    let cards: String = (first..first + count)
        .map(|i| {
            format!(
                r#"<div class="card"><span>Active</span><span>Library ID: {}</span></div>"#,
                card_id(i)
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="card">promo</div><div class="results">{cards}</div></body></html>"#
    )
}

pub(crate) fn target(requested_count: usize, per_scroll_yield: usize) -> TargetSpec {
    TargetSpec {
        requested_count,
        per_scroll_yield,
        timeout: Duration::from_secs(300),
        settle_interval: Duration::from_millis(600),
    }
}

/// Cycles through its frames on every snapshot, ignoring scrolls.
pub(crate) struct FlickeringSession {
    frames: Vec<String>,
    calls: AtomicUsize,
    scrolls: usize,
}

impl FlickeringSession {
    pub(crate) fn new(frames: Vec<String>) -> Self {
        Self {
            frames,
            calls: AtomicUsize::new(0),
            scrolls: 0,
        }
    }

    pub(crate) fn scrolls(&self) -> usize {
        self.scrolls
    }
}

#[async_trait]
impl PageSnapshotProvider for FlickeringSession {
    async fn current_snapshot(&self) -> Result<DocumentSnapshot> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(DocumentSnapshot::new(self.frames[call % self.frames.len()].clone()))
    }
}

#[async_trait]
impl ScrollActuator for FlickeringSession {
    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.scrolls += 1;
        Ok(())
    }
}
