//! Offline session that replays recorded page captures.
//!
//! Frame `i` is what the page looks like after `i` scrolls; scrolling past
//! the last frame keeps showing it. Useful for re-running extraction against
//! saved HTML and for exercising the controller without a browser.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, info};

use adlib_shared::{AdLibError, Result};

use crate::session::{BrowserSession, DocumentSnapshot, PageSnapshotProvider, ScrollActuator};

#[derive(Debug)]
pub struct ReplaySession {
    frames: Vec<String>,
    position: usize,
    loaded: bool,
    released: bool,
    scrolls: usize,
    snapshots: AtomicUsize,
    visited: Vec<String>,
}

impl ReplaySession {
    /// A session with no page loaded yet; call `navigate` first.
    pub fn new(frames: Vec<String>) -> Self {
        Self {
            frames,
            position: 0,
            loaded: false,
            released: false,
            scrolls: 0,
            snapshots: AtomicUsize::new(0),
            visited: Vec::new(),
        }
    }

    /// A session that already shows the first frame.
    pub fn loaded(frames: Vec<String>) -> Self {
        Self {
            loaded: true,
            ..Self::new(frames)
        }
    }

    /// Load every `*.html` file in `dir`, ordered by file name.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| AdLibError::io(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| AdLibError::io(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "html" || ext == "htm") {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(AdLibError::config(format!(
                "no .html captures found in {}",
                dir.display()
            )));
        }

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            frames.push(std::fs::read_to_string(path).map_err(|e| AdLibError::io(path, e))?);
        }

        info!(dir = %dir.display(), frames = frames.len(), "loaded replay captures");
        Ok(Self::new(frames))
    }

    /// Scroll actuations received while a page was loaded.
    pub fn scrolls(&self) -> usize {
        self.scrolls
    }

    pub fn snapshots_taken(&self) -> usize {
        self.snapshots.load(Ordering::Relaxed)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// URLs passed to `navigate`, in order.
    pub fn visited(&self) -> &[String] {
        &self.visited
    }
}

#[async_trait]
impl PageSnapshotProvider for ReplaySession {
    async fn current_snapshot(&self) -> Result<DocumentSnapshot> {
        if !self.loaded || self.released {
            return Err(AdLibError::SnapshotUnavailable("no page loaded".into()));
        }
        let frame = self
            .frames
            .get(self.position)
            .ok_or_else(|| AdLibError::SnapshotUnavailable("replay has no frames".into()))?;
        self.snapshots.fetch_add(1, Ordering::Relaxed);
        Ok(DocumentSnapshot::new(frame.clone()))
    }
}

#[async_trait]
impl ScrollActuator for ReplaySession {
    async fn scroll_to_bottom(&mut self) -> Result<()> {
        if !self.loaded || self.released {
            return Ok(());
        }
        self.scrolls += 1;
        self.position = (self.position + 1).min(self.frames.len().saturating_sub(1));
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ReplaySession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if self.released {
            return Err(AdLibError::session("replay session already released"));
        }
        debug!(url, "replay navigate");
        self.visited.push(url.to_string());
        self.loaded = true;
        self.position = 0;
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_advance_and_clamp() {
        let mut session = ReplaySession::loaded(vec!["a".into(), "b".into()]);
        assert_eq!(session.current_snapshot().await.unwrap().markup(), "a");
        session.scroll_to_bottom().await.unwrap();
        assert_eq!(session.current_snapshot().await.unwrap().markup(), "b");
        session.scroll_to_bottom().await.unwrap();
        assert_eq!(session.current_snapshot().await.unwrap().markup(), "b");
        assert_eq!(session.scrolls(), 2);
        assert_eq!(session.snapshots_taken(), 3);
    }

    #[tokio::test]
    async fn snapshot_requires_navigation() {
        let mut session = ReplaySession::new(vec!["a".into()]);
        assert!(session.current_snapshot().await.is_err());
        session.navigate("https://example.com").await.unwrap();
        assert!(session.current_snapshot().await.is_ok());
        session.release().await.unwrap();
        assert!(session.current_snapshot().await.is_err());
        assert_eq!(session.visited(), ["https://example.com"]);
    }

    #[test]
    fn from_dir_orders_by_name() {
        let dir = std::env::temp_dir().join(format!("adlib-replay-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("02.html"), "second").unwrap();
        std::fs::write(dir.join("01.html"), "first").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let session = ReplaySession::from_dir(&dir).unwrap();
        assert_eq!(session.frames, vec!["first", "second"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_dir_without_captures_fails() {
        let dir = std::env::temp_dir().join(format!("adlib-replay-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(ReplaySession::from_dir(&dir).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
