//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use adlib_core::{ProgressReporter, RunConfig, RunSummary, render_csv, run_search};
use adlib_feed::{BrowserSession, ReplaySession, ScrollObserver};
use adlib_shared::{AppConfig, ScrollState, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// adlib — collect Library IDs from an Ad Library keyword search.
#[derive(Parser)]
#[command(
    name = "adlib",
    version,
    about = "Scroll an Ad Library keyword search and export the Library ID of each ad.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.adlib/adlib.toml.
    #[arg(long, global = true, env = "ADLIB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Search a keyword and extract the first N Library IDs.
    Search {
        /// Keyword to search. Prompted for when omitted.
        keyword: Option<String>,

        /// Number of ads to extract.
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Overall scrolling time budget in seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// CSV output path (defaults to <output_dir>/<keyword>-<timestamp>.csv).
        #[arg(short, long, conflicts_with = "stdout")]
        out: Option<PathBuf>,

        /// Print the CSV to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,

        /// Replay saved *.html captures from this directory instead of launching a browser.
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "adlib=info",
        1 => "adlib=debug",
        _ => "adlib=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Search {
            keyword,
            count,
            timeout,
            out,
            stdout,
            replay,
        } => {
            cmd_search(
                &config,
                keyword,
                count,
                timeout,
                out,
                stdout,
                replay.as_deref(),
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_search(
    config: &AppConfig,
    keyword: Option<String>,
    count: Option<usize>,
    timeout: Option<u64>,
    out: Option<PathBuf>,
    stdout: bool,
    replay: Option<&Path>,
) -> Result<()> {
    let keyword = match keyword {
        Some(k) => k,
        None => prompt_keyword()?,
    };
    if keyword.trim().is_empty() {
        println!("No keyword given, nothing to search.");
        return Ok(());
    }

    let output = if stdout {
        None
    } else {
        Some(out.unwrap_or_else(|| default_output_path(&config.defaults.output_dir, &keyword)))
    };

    let run_config = RunConfig::from_app_config(config, keyword.trim(), count, timeout, output);

    info!(
        keyword = %run_config.keyword,
        count = run_config.target.requested_count,
        timeout_secs = run_config.target.timeout.as_secs(),
        replay = replay.is_some(),
        "starting search"
    );

    let mut session = open_session(config, replay).await?;
    let reporter = CliProgress::new(run_config.target.requested_count);
    let summary = run_search(&run_config, session.as_mut(), &reporter).await?;

    if stdout {
        print!("{}", render_csv(&summary.records));
    } else {
        print_summary(&summary, run_config.target.requested_count);
    }

    Ok(())
}

/// Acquire the browsing session for one run.
async fn open_session(
    config: &AppConfig,
    replay: Option<&Path>,
) -> Result<Box<dyn BrowserSession>> {
    if let Some(dir) = replay {
        return Ok(Box::new(ReplaySession::from_dir(dir)?));
    }

    #[cfg(feature = "chrome")]
    {
        let session = adlib_feed::ChromeSession::launch(&config.browser).await?;
        Ok(Box::new(session))
    }

    #[cfg(not(feature = "chrome"))]
    {
        let _ = config;
        Err(eyre!(
            "this build has no browser support; rebuild with `--features chrome` or pass --replay <DIR>"
        ))
    }
}

fn prompt_keyword() -> Result<String> {
    print!("Enter a keyword to search (e.g. Nike): ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| eyre!("failed to read keyword: {e}"))?;
    Ok(line.trim().to_string())
}

/// `<dir>/<keyword-slug>-<YYYYmmdd-HHMMSS>.csv`
fn default_output_path(dir: &str, keyword: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(dir).join(format!("{}-{stamp}.csv", slugify(keyword)))
}

/// Generate a filesystem-safe slug from a keyword.
fn slugify(keyword: &str) -> String {
    let slug = keyword
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() { "search".into() } else { slug }
}

fn print_summary(summary: &RunSummary, requested: usize) {
    println!();
    println!("  Search complete!");
    println!("  Keyword:   {}", summary.keyword);
    println!("  Reported:  {} active ads", summary.total_results);
    println!("  Extracted: {}/{requested}", summary.records.len());
    let unresolved = summary.unresolved();
    if unresolved > 0 {
        println!("  No ID:     {unresolved} cards recorded as N/A");
    }
    if let Some(shortfall) = &summary.shortfall {
        println!(
            "  Partial:   {} missing ({})",
            shortfall.missing(),
            shortfall.reason
        );
    }
    if let Some(path) = &summary.output_path {
        println!("  Output:    {}", path.display());
    }
    println!("  Time:      {:.1}s", summary.elapsed.as_secs_f64());
    println!();
    for record in &summary.records {
        println!("  {:>3}  {}", record.ordinal(), record.identifier());
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    requested: usize,
}

impl CliProgress {
    fn new(requested: usize) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner, requested }
    }
}

impl ScrollObserver for CliProgress {
    fn checked(&self, state: &ScrollState) {
        self.spinner.set_message(format!(
            "Loaded [{}/{}] ads after {} scrolls",
            state.last_observed_count, self.requested, state.scrolls_performed
        ));
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
