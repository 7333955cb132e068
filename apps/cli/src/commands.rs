//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use groqspec_content::{ContentClient, Drafts};
use groqspec_core::pipeline::{self, GenerateOptions, ProgressReporter, RunSummary};
use groqspec_core::{Debouncer, HtmlCompiler, versions, watch};
use groqspec_shared::{
    AppConfig, CONFIG_FILE_NAME, GroqSpecError, init_config, load_config, load_config_from,
    resolve_token,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// groqspec: build the GROQ specification from the content store.
#[derive(Parser)]
#[command(
    name = "groqspec",
    version,
    about = "Generate the GROQ specification Markdown and HTML from the content store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to the config file (defaults to ./groqspec.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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
    /// Fetch all chapters, write the Markdown and compile the HTML.
    Generate {
        /// Keep running and regenerate whenever a chapter changes.
        #[arg(long)]
        watch: bool,

        /// Only write the Markdown files.
        #[arg(long)]
        no_html: bool,
    },

    /// Write the Markdown files for published chapters (drafts excluded).
    Fetch,

    /// Compile the existing root Markdown file to HTML.
    Html,

    /// Run a command every time a chapter changes.
    Watch {
        /// Program to run.
        command: String,

        /// Arguments passed to the program.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Render the version index page from `<version> <epochSeconds>` lines on stdin.
    Index {
        /// Page heading.
        #[arg(long, default_value = versions::DEFAULT_HEADING)]
        heading: String,
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

/// Crates whose events are shown at the selected verbosity.
const LOG_TARGETS: &[&str] = &[
    "groqspec",
    "groqspec_core",
    "groqspec_content",
    "groqspec_markdown",
    "groqspec_shared",
];

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so `index` can write the page to stdout.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

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
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Generate { watch, no_html } => {
            cmd_generate(&load(config_path)?, watch, !no_html).await
        }
        Command::Fetch => cmd_fetch(&load(config_path)?).await,
        Command::Html => cmd_html(&load(config_path)?).await,
        Command::Watch { command, args } => {
            cmd_watch(&load(config_path)?, &command, &args).await
        }
        Command::Index { heading } => cmd_index(&heading),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn load(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// Build the content client, or exit with the token instructions.
fn connect(config: &AppConfig) -> Result<ContentClient> {
    let token = match resolve_token(&config.content) {
        Ok(token) => token,
        Err(GroqSpecError::MissingToken { env_var }) => {
            println!("ERR: {env_var} is required.");
            println!("ERR: Run `sanity debug --secrets` to retrieve it.");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    Ok(ContentClient::new(&config.content, token)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(config: &AppConfig, watch_mode: bool, compile_html: bool) -> Result<()> {
    let client = connect(config)?;
    let compiler = HtmlCompiler::from_config(&config.html)?;
    let options = GenerateOptions {
        drafts: Drafts::Include,
        compile_html,
    };

    info!(watch = watch_mode, compile_html, "generating docs");

    if !watch_mode {
        let reporter = CliProgress::new();
        let result = pipeline::generate_docs(&client, config, &compiler, options, &reporter).await;
        reporter.spinner.finish_and_clear();
        let summary = result?;
        print_summary(&summary);
        return ensure_complete(&summary);
    }

    // Subscribe first so edits made during the initial run still trigger a rebuild.
    let debouncer = Debouncer::new(client.listen_chapters().await?);

    // In watch mode a failed run is logged and the next change retries.
    let reporter = CliProgress::new();
    let result = pipeline::generate_docs(&client, config, &compiler, options, &reporter).await;
    reporter.spinner.finish_and_clear();
    match result {
        Ok(summary) => print_summary(&summary),
        Err(e) => error!(error = %e, "initial generation failed"),
    }

    let regenerate = pipeline::regenerate_on_change(&client, debouncer, config, &compiler, options);

    tokio::select! {
        _ = regenerate => {}
        _ = tokio::signal::ctrl_c() => info!("stopping watcher"),
    }

    Ok(())
}

async fn cmd_fetch(config: &AppConfig) -> Result<()> {
    let client = connect(config)?;
    let reporter = CliProgress::new();

    let result = pipeline::generate_markdown(&client, config, Drafts::Exclude, &reporter).await;
    reporter.spinner.finish_and_clear();
    let report = result?;

    info!(dir = %config.output.spec_dir.display(), "Generated spec/");
    println!(
        "  Wrote {} file(s) to {}",
        report.written.len(),
        config.output.spec_dir.display()
    );

    if !report.is_complete() {
        return Err(eyre!("{} file(s) could not be written", report.failures.len()));
    }
    Ok(())
}

async fn cmd_html(config: &AppConfig) -> Result<()> {
    let compiler = HtmlCompiler::from_config(&config.html)?;
    let path = pipeline::compile_html(&compiler, config).await?;
    println!("  Compiled {}", path.display());
    Ok(())
}

async fn cmd_watch(config: &AppConfig, command: &str, args: &[String]) -> Result<()> {
    let client = connect(config)?;
    let debouncer = Debouncer::new(client.listen_chapters().await?);

    tokio::select! {
        _ = watch::run_command_on_change(debouncer, command, args) => {}
        _ = tokio::signal::ctrl_c() => info!("stopping watcher"),
    }

    Ok(())
}

/// Render the version index. Never fails: unreadable input renders the draft row only.
fn cmd_index(heading: &str) -> Result<()> {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        warn!(error = %e, "could not read versions from stdin");
        input.clear();
    }

    let records = versions::parse_versions(&input, chrono::Utc::now());
    println!("{}", versions::render_index(&records, heading));
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = init_config(path.unwrap_or_else(|| Path::new(CONFIG_FILE_NAME)))?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = load(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Generated docs");
    println!("  Files:  {}", summary.report.written.len());
    if let Some(html) = &summary.html {
        println!("  HTML:   {}", html.display());
    }
    for failure in &summary.report.failures {
        println!("  Failed: {} ({})", failure.path.display(), failure.message);
    }
    println!("  Time:   {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

fn ensure_complete(summary: &RunSummary) -> Result<()> {
    if summary.report.is_complete() {
        Ok(())
    } else {
        Err(eyre!(
            "{} file(s) could not be written",
            summary.report.failures.len()
        ))
    }
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
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_written(&self, path: &Path, current: usize, total: usize) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.spinner
            .set_message(format!("Writing [{current}/{total}] {name}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}
