//! Application configuration for adlib.
//!
//! User config lives at `~/.adlib/adlib.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AdLibError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "adlib.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".adlib";

// ---------------------------------------------------------------------------
// Config structs (matching adlib.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Per-run defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Scroll pacing and retry limits.
    #[serde(default)]
    pub scroll: ScrollConfig,

    /// Selector strings used to find result cards.
    #[serde(default)]
    pub selectors: SelectorsConfig,

    /// Browser session settings.
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Number of result cards to extract.
    #[serde(default = "default_requested_count")]
    pub requested_count: usize,

    /// Overall time budget for scrolling, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Directory the CSV output is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            requested_count: default_requested_count(),
            timeout_secs: default_timeout_secs(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_requested_count() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_output_dir() -> String {
    ".".into()
}

/// `[scroll]` section.
///
/// The yield and settle values were measured against one page's rendering
/// behaviour; tune them per target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Assumed number of new cards revealed by one scroll.
    #[serde(default = "default_per_scroll_yield")]
    pub per_scroll_yield: usize,

    /// Wait after each scroll before the page is trusted again, in ms.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Maximum number of load-more rounds when too few cards are present.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Polls for the results heading before giving up on readiness.
    #[serde(default = "default_ready_attempts")]
    pub ready_attempts: u32,

    /// Interval between readiness polls, in ms.
    #[serde(default = "default_ready_poll_ms")]
    pub ready_poll_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            per_scroll_yield: default_per_scroll_yield(),
            settle_ms: default_settle_ms(),
            max_retries: default_max_retries(),
            ready_attempts: default_ready_attempts(),
            ready_poll_ms: default_ready_poll_ms(),
        }
    }
}

fn default_per_scroll_yield() -> usize {
    15
}
fn default_settle_ms() -> u64 {
    600
}
fn default_max_retries() -> u32 {
    5
}
fn default_ready_attempts() -> u32 {
    5
}
fn default_ready_poll_ms() -> u64 {
    3000
}

/// `[selectors]` section. CSS selector strings, treated as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorsConfig {
    /// Container that holds all result cards.
    #[serde(default = "default_results_region")]
    pub results_region: String,

    /// One result card, matched only inside the results region.
    #[serde(default = "default_card")]
    pub card: String,

    /// Heading that carries the total result count.
    #[serde(default = "default_results_heading")]
    pub results_heading: String,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            results_region: default_results_region(),
            card: default_card(),
            results_heading: default_results_heading(),
        }
    }
}

fn default_results_region() -> String {
    r#"div[role="main"]"#.into()
}
fn default_card() -> String {
    "div.xh8yej3".into()
}
fn default_results_heading() -> String {
    r#"div[role="heading"][aria-level="3"]"#.into()
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Ad Library search page; query parameters are appended per run.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Run the browser without a window.
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Explicit Chrome/Chromium executable. Auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            chrome_path: None,
        }
    }
}

fn default_base_url() -> String {
    "https://www.facebook.com/ads/library/".into()
}
fn default_true() -> bool {
    true
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.adlib/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| AdLibError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.adlib/adlib.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AdLibError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| AdLibError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AdLibError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| AdLibError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AdLibError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
