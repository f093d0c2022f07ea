//! End-to-end search run against a replayed infinite-scroll feed.

use std::sync::Mutex;

use adlib_core::{ProgressReporter, RunConfig, RunSummary, run_search};
use adlib_feed::{ReplaySession, ScrollObserver};
use adlib_shared::{AppConfig, ScrollState};

/// Records every phase and every count check.
#[derive(Default)]
struct Recorder {
    phases: Mutex<Vec<String>>,
    counts: Mutex<Vec<usize>>,
    finished: Mutex<bool>,
}

impl ScrollObserver for Recorder {
    fn checked(&self, state: &ScrollState) {
        self.counts.lock().unwrap().push(state.last_observed_count);
    }
}

impl ProgressReporter for Recorder {
    fn phase(&self, name: &str) {
        self.phases.lock().unwrap().push(name.to_string());
    }

    fn done(&self, _summary: &RunSummary) {
        *self.finished.lock().unwrap() = true;
    }
}

fn library_id(i: usize) -> String {
    format!("{}", 740_000_000_000_000u64 + i as u64)
}

/// Feed page with `count` rendered ad cards plus decoys outside the results region.
fn feed_page(count: usize) -> String {
    let cards: String = (0..count)
        .map(|i| {
            format!(
                r#"<div class="xh8yej3"><div><span>Active</span></div>
                   <div class="x1rg5ohu x67bb7w"><span>Library ID: {}</span></div>
                   <div>Started running on 3 Oct 2026</div></div>"#,
                library_id(i)
            )
        })
        .collect();
    format!(
        r#"<html><body>
            <div role="banner"><div class="xh8yej3">Ad Library</div></div>
            <div role="main">
                <div role="heading" aria-level="3">~1,400 results</div>
                {cards}
            </div>
        </body></html>"#
    )
}

#[tokio::test(start_paused = true)]
async fn nike_converges_from_zero_to_five() {
    let frames = vec![feed_page(0), feed_page(3), feed_page(5)];
    let mut session = ReplaySession::new(frames);

    let out_dir = std::env::temp_dir().join(format!("adlib-e2e-{}", std::process::id()));
    let out_path = out_dir.join("nike.csv");
    let config = RunConfig::from_app_config(
        &AppConfig::default(),
        "Nike",
        Some(5),
        None,
        Some(out_path.clone()),
    );

    let recorder = Recorder::default();
    let summary = run_search(&config, &mut session, &recorder).await.unwrap();

    assert!(summary.shortfall.is_none());
    assert_eq!(summary.total_results, 1400);
    assert_eq!(summary.keyword, "Nike");

    let ordinals: Vec<usize> = summary.records.iter().map(|r| r.ordinal()).collect();
    assert_eq!(ordinals, vec![1, 2, 3, 4, 5]);
    let ids: Vec<String> = summary
        .records
        .iter()
        .map(|r| r.identifier().to_string())
        .collect();
    assert_eq!(ids, (0..5).map(library_id).collect::<Vec<_>>());

    // One load-more round: budget 1 reveals 3, re-estimated budget 1 reveals 5.
    assert_eq!(*recorder.counts.lock().unwrap(), vec![3, 5]);
    assert_eq!(session.scrolls(), 2);
    assert!(session.is_released());
    assert!(*recorder.finished.lock().unwrap());
    assert!(
        recorder
            .phases
            .lock()
            .unwrap()
            .iter()
            .any(|p| p == "Closing browser session")
    );

    let csv = std::fs::read_to_string(&out_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("index,libraryId"));
    assert_eq!(lines.next(), Some(format!("1,{}", library_id(0)).as_str()));
    assert_eq!(csv.lines().count(), 6);

    let _ = std::fs::remove_dir_all(&out_dir);
}

#[tokio::test(start_paused = true)]
async fn stalled_feed_returns_partial_result() {
    let mut session = ReplaySession::new(vec![feed_page(2)]);
    let mut config =
        RunConfig::from_app_config(&AppConfig::default(), "Nike", Some(5), Some(10), None);
    config.max_retries = 3;

    let summary = run_search(&config, &mut session, &Recorder::default())
        .await
        .unwrap();

    let shortfall = summary.shortfall.expect("partial result");
    assert_eq!(shortfall.requested, 5);
    assert_eq!(shortfall.located, 2);
    assert_eq!(summary.records.len(), 2);
    assert!(session.is_released());
}
