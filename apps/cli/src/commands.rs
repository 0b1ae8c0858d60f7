//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use preprint_alert_core::{Pipeline, PipelineOptions, ProgressReporter, RunOutcome};
use preprint_alert_feed::ArxivFeed;
use preprint_alert_fetcher::ArxivHtmlFetcher;
use preprint_alert_llm::{OpenRouterClient, OpenRouterOptions};
use preprint_alert_shared::{
    AnalysisStatus, AppConfig, PaperId, PipelineError, apply_env_overrides, init_config,
    load_config, load_config_from, resolve_api_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Preprint Alert: a daily digest of the arXiv papers you care about.
#[derive(Parser)]
#[command(
    name = "preprint-alert",
    version,
    about = "Pick today's interesting arXiv papers and write a report about them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.preprint-alert/preprint-alert.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Run the pipeline once and write today's report.
    Run {
        /// Output path for the report (default: <reports_dir>/report-YYYY-MM-DD.md).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the static site from the accumulated reports.
    BuildSite {
        /// Reports directory (default: [output] reports_dir).
        #[arg(long)]
        reports: Option<PathBuf>,

        /// Site output directory (default: [output] site_dir).
        #[arg(long)]
        out: Option<PathBuf>,
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
        0 => "preprint_alert=info",
        1 => "preprint_alert=debug",
        _ => "preprint_alert=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run { output } => cmd_run(config_path, output).await,
        Command::BuildSite { reports, out } => cmd_build_site(config_path, reports, out),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load config from `--config` or the default location, then apply
/// environment overrides.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: Option<&Path>, output: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(config_path)?;
    // Fail before any network call when the key is missing.
    let api_key = resolve_api_key(&config)?;

    let feed = ArxivFeed::new(&config.feed)?;
    let fetcher = ArxivHtmlFetcher::new(&config.fetcher)?;
    let llm = OpenRouterClient::new(OpenRouterOptions::from_config(&config.openrouter, api_key))?;

    info!(
        feed = %config.feed.url,
        model = %llm.model(),
        concurrency = config.pipeline.concurrency,
        "starting preprint alert"
    );

    let pipeline = Pipeline::new(
        Arc::new(feed),
        Arc::new(fetcher),
        Arc::new(llm),
        PipelineOptions::from(&config.pipeline),
    );

    let reporter = CliProgress::new();
    let result = pipeline.run(&reporter).await;
    reporter.clear();
    let path = output.unwrap_or_else(|| default_report_path(&config));
    let outcome = write_report(&path, result)?;

    println!();
    match &outcome {
        RunOutcome::Report {
            selected,
            analyzed_ok,
            fetch_failed,
            analysis_failed,
            ..
        } => {
            println!("  Report written!");
            println!("  Selected:         {selected}");
            println!("  Analyzed:         {analyzed_ok}");
            println!("  Abstract only:    {fetch_failed}");
            println!("  Analysis failed:  {analysis_failed}");
        }
        RunOutcome::Empty { reason } => {
            println!("  Nothing to report today ({}).", reason.as_str());
        }
    }
    println!("  Path: {}", path.display());
    println!();

    Ok(())
}

/// Write the run's report to `path`. A run-fatal error writes nothing, not
/// even the parent directory.
fn write_report(
    path: &Path,
    result: std::result::Result<RunOutcome, PipelineError>,
) -> Result<RunOutcome> {
    let outcome = result.wrap_err("run failed, no report written")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(path, outcome.report_text())
        .wrap_err_with(|| format!("cannot write report to {}", path.display()))?;
    Ok(outcome)
}

/// `<reports_dir>/report-YYYY-MM-DD.md` for today's local date.
fn default_report_path(config: &AppConfig) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d");
    PathBuf::from(&config.output.reports_dir).join(format!("report-{date}.md"))
}

fn cmd_build_site(
    config_path: Option<&Path>,
    reports: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let reports = reports.unwrap_or_else(|| PathBuf::from(&config.output.reports_dir));
    let out = out.unwrap_or_else(|| PathBuf::from(&config.output.site_dir));

    let pages = preprint_alert_site::build_site(&reports, &out)?;
    if pages == 0 {
        println!("No reports found in {}; nothing built.", reports.display());
    } else {
        println!("Built {pages} report pages + index -> {}", out.display());
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_done(&self, id: &PaperId, status: AnalysisStatus, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Analyzing papers [{current}/{total}] {id} ({})",
            status.as_str()
        ));
    }

    fn done(&self, _outcome: &RunOutcome) {
        self.spinner.finish_and_clear();
    }
}
