//! everdex - a persistent filename catalog with instant search.
//!
//! Usage:
//!   everdex index DIR [--cleanup]     Crawl a folder into the catalog
//!   everdex rescan ROOT [--cleanup]   Re-crawl every indexed folder under ROOT
//!   everdex search [TERM]             Query the catalog
//!   everdex exclude DIR               Exclude a folder and its subtree
//!   everdex status                    Show catalog totals
//!   everdex --help                    Show help

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use everdex_catalog::{Catalog, Preferences};
use everdex_core::{
    CatalogConfig, ExclusionState, ResultRow, SearchRequest, SortKey, SortSpec, path_key,
};
use everdex_scan::{Crawler, IndexEvent, start_index, start_rescan};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "everdex=info,everdex_scan=info,everdex_catalog=warn";

/// Preference keys shared with graphical front ends.
const PREF_SORT_COLUMN: &str = "sort_column";
const PREF_SORT_REVERSE: &str = "sort_reverse";

#[derive(Parser)]
#[command(
    name = "everdex",
    version,
    about = "A persistent filename catalog with instant search",
    long_about = "everdex remembers the files under the folders you index and \
                  answers name searches without touching the disk.\n\n\
                  Search terms are separated by `|`. `include!exclude` keeps \
                  names containing the first part but not the second, `*` and \
                  `?` match whole names, anything else is a substring."
)]
struct Cli {
    /// Catalog database file
    #[arg(long, global = true, env = "EVERDEX_DB")]
    db: Option<PathBuf>,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl a folder into the catalog
    Index {
        /// Folder to index
        dir: PathBuf,

        /// Remove records for files that no longer exist
        #[arg(short, long)]
        cleanup: bool,
    },

    /// Re-index every indexed folder under a root (e.g. a mounted drive)
    Rescan {
        /// Root path
        root: PathBuf,

        /// Remove records for files that no longer exist
        #[arg(short, long)]
        cleanup: bool,
    },

    /// Search file names
    Search {
        /// Search string (empty lists the most recently indexed files)
        #[arg(default_value = "")]
        term: String,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Sort column: name, size, type, drive or path (remembered)
        #[arg(short, long)]
        sort: Option<SortKey>,

        /// Sort descending
        #[arg(short, long)]
        desc: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Exclude a folder and everything beneath it
    Exclude {
        /// Folder to exclude
        dir: PathBuf,
    },

    /// Exclude a sub-path of an indexed folder
    ExcludeSub {
        /// Indexed folder
        folder: PathBuf,

        /// Path relative to the folder (e.g. "cache" or "tmp/logs")
        relative: String,
    },

    /// List folders and their exclusion state
    Exclusions,

    /// Clear a folder's exclusions
    Include {
        /// Folder to include again
        dir: PathBuf,
    },

    /// Drop one file from the catalog
    Forget {
        /// File path
        file: PathBuf,
    },

    /// Show catalog totals
    Status,

    /// Delete every record, folder and preference
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Read or write UI preferences
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsAction>,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print one preference
    Get { key: String },

    /// Store a preference (JSON values are parsed, anything else is a string)
    Set { key: String, value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let catalog = Catalog::open(catalog_config(cli.db)?).context("Failed to open catalog")?;
    tracing::debug!(db = %catalog.db_path().display(), "catalog opened");

    match cli.command {
        Command::Index { dir, cleanup } => {
            let dir = absolute(&dir)?;
            let events = start_index(Crawler::new(catalog), dir, cleanup);
            run_crawl(events).await?;
        }
        Command::Rescan { root, cleanup } => {
            let root = absolute(&root)?;
            let events = start_rescan(Crawler::new(catalog), root, cleanup);
            run_crawl(events).await?;
        }
        Command::Search {
            term,
            limit,
            sort,
            desc,
            format,
        } => {
            run_search(&catalog, term, limit, sort, desc, format)?;
        }
        Command::Exclude { dir } => {
            let key = path_key(&absolute(&dir)?);
            let removed = catalog.mark_wholly_excluded(&key)?;
            println!("Excluded {key} ({removed} records removed)");
        }
        Command::ExcludeSub { folder, relative } => {
            let key = path_key(&absolute(&folder)?);
            catalog.add_exclusion_pattern(&key, &relative)?;
            println!("Excluding '{}' under {key}", relative.trim());
        }
        Command::Exclusions => run_exclusions(&catalog)?,
        Command::Include { dir } => {
            let key = path_key(&absolute(&dir)?);
            if catalog.clear_exclusion(&key)? {
                println!("Cleared exclusions for {key}");
            } else {
                println!("{key} is not a known folder");
            }
        }
        Command::Forget { file } => {
            let key = path_key(&absolute(&file)?);
            if catalog.delete_file(&key)? {
                println!("Removed {key}");
            } else {
                println!("{key} is not in the catalog");
            }
        }
        Command::Status => run_status(&catalog)?,
        Command::Reset { yes } => {
            if !yes {
                bail!("Refusing to reset {} without --yes", catalog.db_path().display());
            }
            catalog.reset()?;
            println!("Catalog reset");
        }
        Command::Prefs { action } => run_prefs(&catalog.preferences(), action)?,
    }

    Ok(())
}

/// Install the stderr subscriber.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { DEFAULT_LOG_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve where the catalog lives.
///
/// An explicit database keeps its preferences beside it; otherwise both go
/// to the platform's data and config directories.
fn catalog_config(db: Option<PathBuf>) -> Result<CatalogConfig> {
    let (db_path, prefs_path) = match db {
        Some(path) => (path, None),
        None => {
            let data = dirs::data_dir()
                .ok_or_else(|| eyre!("No data directory on this platform; pass --db"))?;
            let prefs = dirs::config_dir().map(|dir| dir.join("everdex").join("ui-prefs.json"));
            (data.join("everdex").join("everdex.db"), prefs)
        }
    };

    CatalogConfig::builder()
        .db_path(db_path)
        .prefs_path(prefs_path)
        .build()
        .map_err(|e| eyre!("Invalid catalog configuration: {e}"))
}

/// Absolute form of a user-supplied path, resolving symlinks when it exists.
fn absolute(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .with_context(|| format!("Invalid path: {}", path.display()))
}

/// Drain a crawl's events, echoing progress to stderr.
async fn run_crawl(mut events: mpsc::Receiver<IndexEvent>) -> Result<()> {
    let mut stderr = std::io::stderr();
    let mut progress_shown = false;

    while let Some(event) = events.recv().await {
        match event {
            IndexEvent::Progress { folder, files } => {
                let _ = write!(stderr, "\r{} files indexed in {}", files, folder.display());
                let _ = stderr.flush();
                progress_shown = true;
            }
            IndexEvent::Indexed(outcome) => {
                clear_progress(&mut stderr, progress_shown);
                println!("{}", outcome.message);
                if outcome.failed > 0 {
                    eprintln!("{} entries could not be read", outcome.failed);
                }
                return Ok(());
            }
            IndexEvent::Rescanned(outcome) => {
                clear_progress(&mut stderr, progress_shown);
                println!("{}", outcome.message);
                return Ok(());
            }
            IndexEvent::Failed(err) => {
                clear_progress(&mut stderr, progress_shown);
                return Err(err.into());
            }
        }
    }

    Err(eyre!("Crawl stopped without reporting a result"))
}

fn clear_progress(stderr: &mut std::io::Stderr, shown: bool) {
    if shown {
        let _ = writeln!(stderr);
    }
}

/// Run a search and print the rows.
fn run_search(
    catalog: &Catalog,
    term: String,
    limit: Option<usize>,
    sort: Option<SortKey>,
    desc: bool,
    format: OutputFormat,
) -> Result<()> {
    let prefs = catalog.preferences();
    let sort = match sort {
        Some(key) => {
            let mut stored = prefs.load()?;
            stored.insert(PREF_SORT_COLUMN.into(), Value::from(key.to_string()));
            stored.insert(PREF_SORT_REVERSE.into(), Value::from(desc));
            prefs.save(&stored)?;
            Some(SortSpec::new(key, desc))
        }
        None => remembered_sort(&prefs)?,
    };

    let mut request = SearchRequest::new(term);
    if let Some(limit) = limit {
        request = request.with_limit(limit);
    }
    if let Some(sort) = sort {
        request = request.with_sort(sort);
    }

    let rows = catalog.search(&request)?;
    match format {
        OutputFormat::Text => print_rows(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }

    Ok(())
}

/// Sort saved by an earlier `--sort`, if it is still valid.
fn remembered_sort(prefs: &Preferences) -> Result<Option<SortSpec>> {
    let stored = prefs.load()?;
    let Some(key) = stored
        .get(PREF_SORT_COLUMN)
        .and_then(Value::as_str)
        .and_then(|column| column.parse::<SortKey>().ok())
    else {
        return Ok(None);
    };
    let descending = stored
        .get(PREF_SORT_REVERSE)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Ok(Some(SortSpec::new(key, descending)))
}

fn print_rows(rows: &[ResultRow]) {
    if rows.is_empty() {
        println!("No matching files.");
        return;
    }

    println!("{:<40} {:>10} {:<8} {:<7} Path", "Name", "Size", "Type", "Drive");
    println!("{}", "─".repeat(100));
    for row in rows {
        println!(
            "{:<40} {:>10} {:<8} {:<7} {}",
            truncate(&row.name, 40),
            format_size(row.size),
            row.file_type,
            row.drive,
            row.path
        );
    }
    println!();
    println!("{} files", rows.len());
}

fn run_exclusions(catalog: &Catalog) -> Result<()> {
    let folders = catalog.folders()?;
    if folders.is_empty() {
        println!("No folders indexed.");
        return Ok(());
    }

    for folder in folders {
        match folder.exclusion {
            ExclusionState::Included => println!("  {}", folder.path),
            ExclusionState::Wholly => println!("✗ {} (excluded)", folder.path),
            ExclusionState::Patterns(patterns) => {
                println!("  {} (skipping {})", folder.path, patterns.join(", "));
            }
        }
    }
    Ok(())
}

fn run_status(catalog: &Catalog) -> Result<()> {
    let db_size = std::fs::metadata(catalog.db_path())
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Catalog:  {} ({})", catalog.db_path().display(), format_size(db_size));
    println!("Files:    {}", catalog.file_count()?);
    println!("Folders:  {} active", catalog.count_active_folders()?);
    println!("Excluded: {}", catalog.wholly_excluded_folders()?.len());
    Ok(())
}

fn run_prefs(prefs: &Preferences, action: Option<PrefsAction>) -> Result<()> {
    let mut stored = prefs.load()?;
    match action {
        None => println!("{}", serde_json::to_string_pretty(&stored)?),
        Some(PrefsAction::Get { key }) => match stored.get(&key) {
            Some(value) => println!("{value}"),
            None => bail!("No preference named '{key}'"),
        },
        Some(PrefsAction::Set { key, value }) => {
            let value: Value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            stored.insert(key, value);
            prefs.save(&stored)?;
        }
    }
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to a number of characters.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars - 1).collect();
        format!("{kept}…")
    }
}
