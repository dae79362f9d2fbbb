//! CLI command definitions, routing, and tracing setup.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use reportdesk_ingest::{
    ArchiveStore, Discovery, MoveOutcome, Relocator, WatchReporter, Watcher,
};
use reportdesk_render::{Artifact, GenerateConfig, Renderer, generate};
use reportdesk_shared::{AppConfig, Fragment, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ReportDesk — collect report section fragments and assemble the final PDF.
#[derive(Parser)]
#[command(
    name = "reportdesk",
    version,
    about = "Archive report section fragments from Downloads and render the assembled report.",
    long_about = None,
)]
pub(crate) struct Cli {
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
    /// Move report fragments from Downloads into the archive, once.
    Move {
        /// Source directory (defaults to the OS downloads directory).
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// List archived sections, newest revision first.
    List,

    /// Watch Downloads and archive new fragments until Ctrl-C.
    Watch {
        /// Seconds between scans (defaults to the configured interval).
        #[arg(short, long)]
        interval: Option<u64>,

        /// Source directory (defaults to the OS downloads directory).
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Assemble the archived sections and render the final report.
    Generate {
        /// Output artifact name (defaults to report_final_<timestamp>.pdf).
        #[arg(short, long)]
        output: Option<String>,

        /// Template document path (overrides the configured one).
        #[arg(long)]
        template: Option<PathBuf>,
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

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directives(cli.verbose)));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Move { source, yes } => cmd_move(source, yes).await,
        Command::List => cmd_list().await,
        Command::Watch { interval, source } => cmd_watch(interval, source).await,
        Command::Generate { output, template } => cmd_generate(output, template).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// move
// ---------------------------------------------------------------------------

async fn cmd_move(source: Option<PathBuf>, yes: bool) -> Result<()> {
    let config = load_config()?;
    let source_dir = match source {
        Some(dir) => dir,
        None => config.directories.resolve_downloads_dir()?,
    };

    require_dir(&source_dir)?;

    info!(dir = %source_dir.display(), "searching for report fragments");

    let discovery = Discovery::new(&config.discovery.patterns);
    let found = discovery.scan(&source_dir)?;

    if found.is_empty() {
        println!("No report files found in {}", source_dir.display());
        return Ok(());
    }

    println!("Found {} file(s):", found.len());
    for path in &found {
        println!("  {}", path.file_name().unwrap_or_default().to_string_lossy());
    }

    if !yes && !confirm("Move these files? (y/n): ")? {
        println!("Operation cancelled");
        return Ok(());
    }

    let store = ArchiveStore::open(&config.directories.archive_dir)?;
    let relocator = Relocator::new(store);
    let outcomes = relocator.relocate_all(&found);

    print_outcomes(&outcomes);

    let moved = outcomes.iter().filter(|o| o.is_moved()).count();
    println!();
    println!("Moved {moved} of {} file(s)", outcomes.len());

    Ok(())
}

/// Ask a yes/no question on stdout/stdin.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn print_outcomes(outcomes: &[MoveOutcome]) {
    for outcome in outcomes {
        let name = outcome
            .source
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        match &outcome.outcome {
            Ok(dest) => println!(
                "  moved: {name} -> {}",
                dest.file_name().unwrap_or_default().to_string_lossy()
            ),
            Err(e) => println!("  error: {name} - {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

async fn cmd_list() -> Result<()> {
    let config = load_config()?;
    let store = ArchiveStore::open(&config.directories.archive_dir)?;
    let stored = store.list()?;

    if stored.is_empty() {
        println!("No saved sections in {}", store.dir().display());
        return Ok(());
    }

    // Group by sectionId from each body; unreadable bodies are listed, not
    // fatal.
    let mut by_section: BTreeMap<String, Vec<&reportdesk_ingest::StoredFragment>> = BTreeMap::new();
    let mut authors: BTreeMap<String, String> = BTreeMap::new();

    for item in &stored {
        let section = match std::fs::read_to_string(&item.path)
            .ok()
            .and_then(|body| serde_json::from_str::<Fragment>(&body).ok())
        {
            Some(fragment) => {
                if let Some((author, _)) = fragment.metadata() {
                    authors.insert(item.file_name.clone(), author.to_string());
                }
                fragment.section_id
            }
            None => "(unreadable)".to_string(),
        };
        by_section.entry(section).or_default().push(item);
    }

    println!("Saved sections in {}:", store.dir().display());
    for (section, files) in &by_section {
        println!();
        println!("{section}:");
        for (i, item) in files.iter().enumerate() {
            let connector = if i == files.len() - 1 { "└─" } else { "├─" };
            let newest = if i == 0 { " [latest]" } else { "" };
            let modified: DateTime<Local> = item.modified.into();

            println!("  {connector} {}{newest}", item.file_name);
            if let Some(author) = authors.get(&item.file_name) {
                println!("       author: {author}");
            }
            println!(
                "       modified: {}  ({:.1} KB)",
                modified.format("%Y-%m-%d %H:%M:%S"),
                item.size_bytes as f64 / 1024.0
            );
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// watch
// ---------------------------------------------------------------------------

/// Spinner-backed reporter for the watch loop.
struct WatchSpinner {
    spinner: ProgressBar,
}

impl WatchSpinner {
    fn new(dir: &std::path::Path, interval: Duration) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner.set_message(format!(
            "Watching {} (every {}s, Ctrl-C to stop)",
            dir.display(),
            interval.as_secs()
        ));
        Self { spinner }
    }
}

impl WatchReporter for WatchSpinner {
    fn scanned(&self, outcomes: &[MoveOutcome]) {
        for outcome in outcomes {
            let name = outcome
                .source
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            match &outcome.outcome {
                Ok(_) => self.spinner.println(format!("  archived: {name}")),
                Err(e) => self.spinner.println(format!("  error: {name} - {e}")),
            }
        }
    }

    fn idle(&self) {}
}

async fn cmd_watch(interval: Option<u64>, source: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let source_dir = match source {
        Some(dir) => dir,
        None => config.directories.resolve_downloads_dir()?,
    };
    require_dir(&source_dir)?;
    let interval = Duration::from_secs(interval.unwrap_or(config.watch.interval_secs));

    let store = ArchiveStore::open(&config.directories.archive_dir)?;
    let discovery = Discovery::new(&config.discovery.patterns);
    let mut watcher = Watcher::new(discovery, Relocator::new(store), &source_dir);

    let reporter = WatchSpinner::new(&source_dir, interval);
    let summary = watcher.run(interval, &reporter).await;
    reporter.spinner.finish_and_clear();

    println!();
    println!("Stopped watching after {} tick(s)", summary.ticks);
    println!("  archived: {}", summary.moved);
    if summary.failed > 0 {
        println!("  failed:   {}", summary.failed);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

async fn cmd_generate(output: Option<String>, template: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let generate_config = GenerateConfig::from_app(&config, output, template);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));

    spinner.set_message("Probing PDF converters");
    let renderer = Renderer::with_defaults();

    spinner.set_message(format!("Rendering via {}", renderer.active_name()));
    let result = generate(&generate_config, &renderer)?;
    spinner.finish_and_clear();

    println!();
    println!("  Report generated!");
    println!("  Backend:  {}", result.backend);
    println!("  Sections: {}", result.sections_loaded.join(", "));
    if !result.sections_missing.is_empty() {
        println!("  Missing:  {}", result.sections_missing.join(", "));
    }
    println!("  Artifact: {}", result.artifact.path().display());
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());

    if let Artifact::FilledHtml { instructions, .. } = &result.artifact {
        println!();
        println!("{instructions}");
    }
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers shared by handlers
// ---------------------------------------------------------------------------

/// Reject a missing source directory early with a readable message.
fn require_dir(path: &std::path::Path) -> Result<()> {
    if !path.is_dir() {
        return Err(eyre!("'{}' is not a directory", path.display()));
    }
    Ok(())
}

/// Filter directives for the workspace crates. `EnvFilter` matches targets
/// on `::` boundaries, so each crate is listed by its real module name.
fn log_directives(verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    [
        "reportdesk_cli",
        "reportdesk_shared",
        "reportdesk_ingest",
        "reportdesk_render",
    ]
    .map(|target| format!("{target}={level}"))
    .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_directives_name_the_workspace_crates() {
        let directives = log_directives(1);
        assert!(directives.contains("reportdesk_ingest=debug"));
        assert!(directives.contains("reportdesk_render=debug"));
        assert!(!directives.contains("reportdesk=debug,"));

        assert_eq!(log_directives(0).matches("=info").count(), 4);
        assert_eq!(log_directives(3).matches("=trace").count(), 4);
    }
}
