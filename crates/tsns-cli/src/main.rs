//! CLI entry point for tsns.
//!
//! Offers namespace imports (`import * as name from 'path';`) for the
//! TypeScript projects under a directory.
//!
//! # Usage
//!
//! ```bash
//! tsns [OPTIONS] <COMMAND>
//!
//! # List projects and how many modules each can import
//! tsns scan --path ./repo --detailed
//!
//! # Completions for "str" typed in a file
//! tsns query --from src/app/main.ts --prefix str
//!
//! # Keep the index live and answer "<file> <prefix>" lines from stdin
//! tsns watch --path ./repo
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tsns_core::import::{has_existing_import, render_import_statement};
use tsns_core::paths::normalize;
use tsns_core::{Config, FileEvent, ModuleForCompletion, QuoteStyle};
use tsns_index::{
    DiskTree, EngineConfig, IndexEngine, IndexError, ProjectIndex, ProjectSummary, SourceTree,
    StatsSnapshot,
};
use tsns_watcher::{FileWatcher, SourceFilter};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Namespace import completion for TypeScript projects.
///
/// Discovers every `tsconfig.json` under the root and classifies each source
/// file as importable by alias, by `baseUrl`, or by relative path.
#[derive(Parser)]
#[command(name = "tsns", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Root directory to index.
    ///
    /// Defaults to the configured root, or the current directory.
    #[arg(short, long, global = true, env = "TSNS_PATH")]
    path: Option<Utf8PathBuf>,

    /// JSON configuration file.
    #[arg(short, long, global = true, env = "TSNS_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Quote style for rendered import statements.
    #[arg(long, global = true, value_enum)]
    quote: Option<QuoteArg>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan the root and summarize the projects found.
    Scan {
        /// Show each project's compiler options.
        #[arg(short, long)]
        detailed: bool,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the imports offered for a prefix typed in a file.
    Query {
        /// The file being edited.
        #[arg(long)]
        from: Utf8PathBuf,

        /// What has been typed so far.
        #[arg(long)]
        prefix: String,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Keep the index up to date and answer `<file> <prefix>` lines on stdin.
    Watch {
        /// Output format for answers.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Output format.
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text.
    Text,
    /// JSON.
    Json,
}

/// Quote style flag.
#[derive(Clone, Copy, ValueEnum)]
enum QuoteArg {
    /// `'path'`
    Single,
    /// `"path"`
    Double,
}

impl From<QuoteArg> for QuoteStyle {
    fn from(arg: QuoteArg) -> Self {
        match arg {
            QuoteArg::Single => Self::Single,
            QuoteArg::Double => Self::Double,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects `RUST_LOG` if set; otherwise `debug` with `--verbose`, `info`
/// by default. Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},mio=warn,notify=warn,globset=warn,ignore=warn"))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the optional config file and CLI overrides.
///
/// # Errors
///
/// Returns an error if the config file can't be loaded or the root is not
/// a directory.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config {path}: {e}"))?,
        None => Config::default(),
    };

    if let Some(path) = &cli.path {
        config.scan.root_path.clone_from(path);
    } else if config.scan.root_path.as_str().is_empty() {
        config.scan.root_path = Utf8PathBuf::from(".");
    }
    if let Some(quote) = cli.quote {
        config.completion.quote_style = quote.into();
    }

    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration: {e}"))?;
    Ok(config)
}

/// Scans the configured root into a fresh index.
fn build_index(config: &Config) -> color_eyre::Result<(DiskTree, ProjectIndex)> {
    let tree = DiskTree::new(&config.scan)?;
    let index = ProjectIndex::new(tree.rules().clone());
    index.rebuild_from(&tree)?;
    Ok((tree, index))
}

/// Makes `file` absolute and canonical so it matches indexed paths.
///
/// A file that doesn't exist yet is resolved through its parent directory.
fn resolve_file(file: &Utf8Path) -> color_eyre::Result<Utf8PathBuf> {
    if let Ok(canonical) = file.canonicalize_utf8() {
        return Ok(canonical);
    }

    let cwd = Utf8PathBuf::try_from(std::env::current_dir()?)?;
    let absolute = normalize(&cwd.join(file));
    let resolved = match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize_utf8()
            .map_or_else(|_| absolute.clone(), |parent| parent.join(name)),
        _ => absolute,
    };
    Ok(resolved)
}

// =============================================================================
// COMPLETION
// =============================================================================

/// Filters raw index results down to what an editor would show.
///
/// Keeps modules whose name starts with `prefix` (ignoring case), drops
/// those `document` already imports, and sorts by name.
fn completions(
    mut candidates: Vec<ModuleForCompletion>,
    prefix: &str,
    document: &str,
) -> Vec<ModuleForCompletion> {
    let prefix = prefix.to_lowercase();
    candidates.retain(|module| {
        module.module_name.to_lowercase().starts_with(&prefix)
            && !has_existing_import(document, &module.module_name, &module.import_path)
    });
    candidates.sort();
    candidates.dedup();
    candidates
}

/// Answers one query against `index`.
fn answer(index: &ProjectIndex, from: &Utf8Path, prefix: &str) -> Vec<ModuleForCompletion> {
    let document = std::fs::read_to_string(from).unwrap_or_default();
    completions(index.query(from, prefix), prefix, &document)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs a one-shot scan with summary output.
fn run_scan(config: &Config, detailed: bool, format: OutputFormat) -> color_eyre::Result<()> {
    info!(root = %config.scan.root_path, "Starting scan");

    let (tree, index) = build_index(config)?;
    let projects = index.projects();
    let stats = index.stats().snapshot();

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match format {
        OutputFormat::Json => {
            #[derive(serde::Serialize)]
            struct Report<'a> {
                root: &'a Utf8Path,
                indexed_files: usize,
                stats: StatsSnapshot,
                projects: &'a [ProjectSummary],
            }

            let report = Report {
                root: tree.root(),
                indexed_files: index.indexed_file_count(),
                stats,
                projects: &projects,
            };
            serde_json::to_writer_pretty(&mut handle, &report)?;
            writeln!(handle)?;
        }
        OutputFormat::Text => {
            print_scan_summary(&mut handle, tree.root(), &index, &projects, detailed)?;
            if stats.config_errors + stats.io_errors > 0 {
                writeln!(handle)?;
                writeln!(
                    handle,
                    "Skipped: {} invalid tsconfig, {} unreadable",
                    stats.config_errors, stats.io_errors
                )?;
            }
        }
    }

    Ok(())
}

/// Runs a one-shot query.
fn run_query(
    config: &Config,
    from: &Utf8Path,
    prefix: &str,
    format: OutputFormat,
) -> color_eyre::Result<()> {
    let (_tree, index) = build_index(config)?;
    let from = resolve_file(from)?;
    debug!(from = %from, prefix, "Querying");

    let results = answer(&index, &from, prefix);

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_answer(&mut handle, &results, format, config.completion.quote_style)
}

/// Runs the engine and watcher, answering queries from stdin.
async fn run_watch(config: Config, format: OutputFormat) -> color_eyre::Result<()> {
    let tree = DiskTree::new(&config.scan)?;
    info!(root = %tree.root(), "Starting watch");

    let filter = SourceFilter::new(tree.rules().clone());
    let root = tree.root().to_owned();
    let index = Arc::new(ProjectIndex::new(tree.rules().clone()));
    let engine = IndexEngine::spawn(Arc::new(tree), index, EngineConfig::from(&config.index));

    engine.initialize()?;
    engine.flush().await?;
    info!(
        projects = engine.index().project_paths().len(),
        files = engine.index().indexed_file_count(),
        "Initial scan complete"
    );

    let mut watcher = FileWatcher::new(&root, &config.watch, filter).await?;
    info!(path = %watcher.watch_path(), "Watching for changes");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let terminate = terminate_signal();
    tokio::pin!(terminate);

    loop {
        tokio::select! {
            Some(event) = watcher.recv() => {
                engine.on_file_event(event)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    break;
                };
                let Some((file, prefix)) = parse_request(&line) else {
                    warn!(line = %line, "Expected '<file> <prefix>'");
                    continue;
                };
                let pending = forward_pending(|| watcher.try_recv(), &engine)?;
                engine.flush().await?;
                debug!(pending, "Applied buffered changes before query");
                let from = resolve_file(Utf8Path::new(file))?;
                let results = answer(engine.index(), &from, prefix);

                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                write_answer(&mut handle, &results, format, config.completion.quote_style)?;
                handle.flush()?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
            result = &mut terminate => {
                result?;
                info!("Received SIGTERM, shutting down");
                break;
            }
        }
    }

    watcher.shutdown().await?;
    engine.shutdown().await;
    Ok(())
}

/// Hands every already-buffered change to the engine.
///
/// Returns how many were forwarded.
fn forward_pending(
    mut next: impl FnMut() -> Option<FileEvent>,
    engine: &IndexEngine,
) -> Result<usize, IndexError> {
    let mut count = 0;
    while let Some(event) = next() {
        engine.on_file_event(event)?;
        count += 1;
    }
    Ok(count)
}

/// Resolves when the process is asked to terminate.
async fn terminate_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        sigterm.recv().await;
    }

    #[cfg(not(unix))]
    std::future::pending::<()>().await;

    Ok(())
}

/// Splits `<file> <prefix>`; the file may not contain whitespace.
fn parse_request(line: &str) -> Option<(&str, &str)> {
    let (file, prefix) = line.trim().split_once(char::is_whitespace)?;
    let prefix = prefix.trim();
    (!file.is_empty() && !prefix.is_empty()).then_some((file, prefix))
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_scan_summary(
    handle: &mut impl Write,
    root: &Utf8Path,
    index: &ProjectIndex,
    projects: &[ProjectSummary],
    detailed: bool,
) -> std::io::Result<()> {
    writeln!(handle)?;
    writeln!(handle, "TypeScript Projects")?;
    writeln!(handle, "===================")?;
    writeln!(handle)?;
    writeln!(handle, "Root:           {root}")?;
    writeln!(handle, "Projects:       {}", projects.len())?;
    writeln!(handle, "Indexed files:  {}", index.indexed_file_count())?;
    writeln!(handle, "Module entries: {}", index.module_count())?;

    for project in projects {
        writeln!(handle)?;
        writeln!(handle, "{}", project.path)?;
        writeln!(
            handle,
            "  Bare imports:     {}",
            project.bare_modules
        )?;
        writeln!(
            handle,
            "  Relative imports: {}",
            project.relative_modules
        )?;

        if !detailed {
            continue;
        }
        let config = &project.config;
        if let Some(base_url) = &config.base_url {
            writeln!(handle, "  baseUrl: {base_url}")?;
        }
        if let Some(out_dir) = &config.out_dir {
            writeln!(handle, "  outDir:  {out_dir}")?;
        }
        if let Some(root_dir) = &config.root_dir {
            writeln!(handle, "  rootDir: {root_dir}")?;
        }
        for (pattern, templates) in config.paths.iter().flatten() {
            writeln!(handle, "  paths:   {pattern} -> {}", templates.join(", "))?;
        }
    }

    Ok(())
}

fn write_answer(
    handle: &mut impl Write,
    results: &[ModuleForCompletion],
    format: OutputFormat,
    quote: QuoteStyle,
) -> color_eyre::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *handle, results)?;
            writeln!(handle)?;
        }
        OutputFormat::Text => {
            for module in results {
                write!(
                    handle,
                    "{}",
                    render_import_statement(&module.module_name, &module.import_path, quote)
                )?;
            }
            writeln!(handle)?;
        }
    }
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.no_color);

    let config = build_config(&cli)?;

    match &cli.command {
        Commands::Scan { detailed, format } => run_scan(&config, *detailed, *format),
        Commands::Query {
            from,
            prefix,
            format,
        } => run_query(&config, from, prefix, *format),
        Commands::Watch { format } => run_watch(config, *format).await,
    }
}
