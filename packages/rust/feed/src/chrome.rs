//! Headless Chrome session using chromiumoxide.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tracing::{debug, info, warn};

use adlib_shared::{AdLibError, BrowserConfig, Result};

use crate::session::{BrowserSession, DocumentSnapshot, PageSnapshotProvider, ScrollActuator};

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Browser session backed by a locally launched Chrome/Chromium.
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handle: tokio::task::JoinHandle<()>,
}

impl ChromeSession {
    /// Launch the browser. Failure to start is a session error.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromeConfig::builder()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            .window_size(config.window_width, config.window_height);

        // Headed launch disables chromiumoxide's legacy `--headless` flag.
        builder = builder.with_head();
        if config.headless {
            builder = builder.arg("--headless=new");
        }

        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let chrome_config = builder
            .build()
            .map_err(|e| AdLibError::session(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| AdLibError::session(format!("failed to launch browser: {e}")))?;

        // The handler drives the CDP connection and must keep running.
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });

        info!(headless = config.headless, "browser launched");

        Ok(Self {
            browser: Some(browser),
            page: None,
            handle,
        })
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| AdLibError::SnapshotUnavailable("no page loaded".into()))
    }
}

#[async_trait]
impl PageSnapshotProvider for ChromeSession {
    async fn current_snapshot(&self) -> Result<DocumentSnapshot> {
        let html = self
            .page()?
            .content()
            .await
            .map_err(|e| AdLibError::SnapshotUnavailable(format!("failed to read page: {e}")))?;
        Ok(DocumentSnapshot::new(html))
    }
}

#[async_trait]
impl ScrollActuator for ChromeSession {
    async fn scroll_to_bottom(&mut self) -> Result<()> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| AdLibError::session("scroll requested before navigation"))?;
        if let Err(e) = page.evaluate(SCROLL_TO_BOTTOM_JS).await {
            // Fire-and-forget: a failed scroll just means fewer cards this round.
            warn!(error = %e, "scroll script failed");
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| AdLibError::session("browser already closed"))?;

        let page = browser
            .new_page(url)
            .await
            .map_err(|e| AdLibError::session(format!("failed to open {url}: {e}")))?;
        if let Err(e) = page.wait_for_navigation().await {
            warn!(url, error = %e, "navigation did not settle");
        }

        info!(url, "navigated");
        self.page = Some(page);
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        if let Some(mut browser) = self.browser.take() {
            let closed = browser.close().await;
            let _ = browser.wait().await;
            self.handle.abort();
            closed.map_err(|e| AdLibError::session(format!("failed to close browser: {e}")))?;
            info!("browser session closed");
        }
        Ok(())
    }
}
