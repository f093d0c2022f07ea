//! Shared types, error model, and configuration for adlib.
//!
//! This crate is the foundation depended on by all other adlib crates.
//! It provides:
//! - [`AdLibError`] — the unified error type
//! - Domain types ([`ExtractedRecord`], [`TargetSpec`], [`ScrollState`], [`Shortfall`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BrowserConfig, DefaultsConfig, ScrollConfig, SelectorsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{AdLibError, Result};
pub use types::{
    Extraction, ExtractedRecord, RunId, ScrollState, Shortfall, ShortfallReason, TargetSpec,
    UNRESOLVED_ID,
};
