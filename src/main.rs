use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use free_pdf_search::aggregator::{Aggregator, SearchError};
use free_pdf_search::config::{default_config_path, load_config, Config, CONFIG_FILE_NAME};
use free_pdf_search::models::{DocumentRecord, SearchOutcome};
use free_pdf_search::ui::{self, Spinner, Status};
use free_pdf_search::utils::display::{documents_plain, documents_table, history_table};
use free_pdf_search::utils::{
    is_terminal, terminal_width, BookmarkService, CacheResult, CacheService, FileStore,
    HistoryService, MemoryStore, Store,
};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Free PDF Search - find free PDFs and books on a topic
#[derive(Parser, Debug)]
#[command(name = "free-pdf-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search arXiv, DOAJ and OpenLibrary for free documents, with an AI-grounded fallback", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-source timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Neither read nor write the result cache
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search all sources for a topic
    #[command(alias = "s")]
    Search {
        /// Search topic
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Show or clear recent searches
    History {
        /// Number of entries to show (default: all kept entries)
        #[arg(long, short)]
        limit: Option<usize>,

        /// Clear the history
        #[arg(long)]
        clear: bool,
    },

    /// Manage saved documents
    #[command(alias = "b")]
    Bookmarks {
        #[command(subcommand)]
        command: BookmarkCommands,
    },

    /// Manage the local result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Create or inspect the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum BookmarkCommands {
    /// List saved documents
    List,

    /// Save a result of a previous search
    Add {
        /// The query as it was searched
        query: String,

        /// Position of the result in that search (1-based)
        index: usize,
    },

    /// Remove a saved document by URL
    Remove { url: String },
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Clear cached results (all, or one query)
    Clear {
        #[arg(long)]
        query: Option<String>,
    },

    /// Show cache statistics
    Stats,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Target path (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over the verbosity flags, which win over the config file.
fn init_logging(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("free_pdf_search={},warn", level));

    let json = config.logging.is_json();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

/// Open the persistent store, falling back to memory when the directory is unusable
fn open_store(config: &Config) -> (Arc<dyn Store>, Option<FileStore>) {
    let dir = config.cache.resolved_directory();
    match FileStore::open(&dir) {
        Ok(store) => (Arc::new(store.clone()), Some(store)),
        Err(e) => {
            tracing::warn!(
                "Cannot open store at {} ({}); nothing will be saved",
                dir.display(),
                e
            );
            (Arc::new(MemoryStore::new()), None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(Some(path))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => load_config(None).context("Failed to load configuration")?,
    };
    if let Some(secs) = cli.timeout {
        config.sources.timeout_seconds = secs;
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }

    init_logging(&cli, &config);

    let format = cli.output.resolve();

    match &cli.command {
        Commands::Search { query } => {
            let query = query.join(" ");
            let (store, _) = open_store(&config);
            let aggregator = Aggregator::from_config(&config, store)?;
            run_search(&aggregator, &query, format, cli.quiet).await
        }

        Commands::History { limit, clear } => {
            let (store, _) = open_store(&config);
            let history = HistoryService::with_limit(store, config.history.max_entries);

            if *clear {
                history.clear()?;
                if !cli.quiet {
                    ui::print_status(Status::Success, "History cleared.");
                }
                return Ok(());
            }

            let entries = history.read_entries(limit.unwrap_or(history.limit()))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
                OutputFormat::Plain => {
                    for entry in &entries {
                        println!("{}\t{}", entry.timestamp.to_rfc3339(), entry.query);
                    }
                }
                _ if entries.is_empty() => ui::print_status(Status::Info, "No searches yet."),
                _ => println!("{}", history_table(&entries)),
            }
            Ok(())
        }

        Commands::Bookmarks { command } => {
            let (store, _) = open_store(&config);
            let bookmarks = BookmarkService::new(Arc::clone(&store));

            match command {
                BookmarkCommands::List => {
                    let saved = bookmarks.list()?;
                    if saved.is_empty() && format == OutputFormat::Table {
                        ui::print_status(Status::Info, "No bookmarks yet.");
                    } else {
                        output_documents(&saved, format)?;
                    }
                }
                BookmarkCommands::Add { query, index } => {
                    // Read through an enabled cache even under --no-cache
                    let cache = CacheService::new(store);
                    let document = select_cached(&cache, query, *index)?;
                    if bookmarks.contains(&document.url)? {
                        ui::print_status(Status::Info, &format!("Already saved: {}", document.title));
                    } else {
                        bookmarks.toggle(&document)?;
                        if !cli.quiet {
                            ui::print_status(Status::Success, &format!("Saved: {}", document.title));
                        }
                    }
                }
                BookmarkCommands::Remove { url } => {
                    if bookmarks.remove(url)? {
                        if !cli.quiet {
                            ui::print_status(Status::Success, "Bookmark removed.");
                        }
                    } else {
                        ui::print_status(Status::Warning, &format!("No bookmark for {}", url));
                    }
                }
            }
            Ok(())
        }

        Commands::Cache { command } => {
            let (store, file_store) = open_store(&config);
            let cache = if config.cache.enabled {
                CacheService::new(store)
            } else {
                CacheService::disabled(store)
            };

            match command {
                CacheCommands::Clear { query: Some(query) } => {
                    cache.clear_search(query)?;
                    if !cli.quiet {
                        ui::print_status(
                            Status::Success,
                            &format!("Cleared cached results for \"{}\".", query.trim()),
                        );
                    }
                }
                CacheCommands::Clear { query: None } => {
                    let removed = cache.clear_all()?;
                    if !cli.quiet {
                        ui::print_status(
                            Status::Success,
                            &format!("Cache cleared ({} queries).", removed),
                        );
                    }
                }
                CacheCommands::Stats => {
                    let stats = cache.stats()?;
                    if format == OutputFormat::Json {
                        let value = serde_json::json!({
                            "enabled": stats.enabled,
                            "directory": file_store.as_ref().map(|s| s.dir().display().to_string()),
                            "queries": stats.query_count,
                            "documents": stats.document_count,
                            "size_bytes": file_store.as_ref().map(|s| s.size_bytes()),
                        });
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    } else {
                        ui::print_section("Cache");
                        println!("Enabled:   {}", stats.enabled);
                        if let Some(fs) = &file_store {
                            println!("Directory: {}", fs.dir().display());
                            println!("Size:      {}", ui::format_file_size(fs.size_bytes()));
                        }
                        println!("Queries:   {}", stats.query_count);
                        println!("Documents: {}", stats.document_count);
                    }
                }
            }
            Ok(())
        }

        Commands::Config { command } => {
            match command {
                ConfigCommands::Init { path, force } => {
                    let path = path
                        .clone()
                        .or_else(default_config_path)
                        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
                    Config::init(&path, *force)?;
                    if !cli.quiet {
                        ui::print_status(
                            Status::Success,
                            &format!("Wrote default configuration to {}", path.display()),
                        );
                    }
                }
                ConfigCommands::Show => {
                    let mut shown = config.clone();
                    if shown.fallback.api_key.is_some() {
                        shown.fallback.api_key = Some("<redacted>".to_string());
                    }
                    print!("{}", shown.to_toml()?);
                }
            }
            Ok(())
        }
    }
}

async fn run_search(aggregator: &Aggregator, query: &str, format: OutputFormat, quiet: bool) -> Result<()> {
    let spinner = if format == OutputFormat::Table && !quiet {
        Spinner::new(&format!("Searching for \"{}\"...", query.trim()))
    } else {
        Spinner::hidden()
    };

    let start = Instant::now();
    let result = aggregator.search(query).await;
    spinner.finish();

    match result {
        Ok(outcome @ SearchOutcome::Found { .. }) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                if format == OutputFormat::Table && !quiet {
                    ui::print_search_header(
                        outcome.query(),
                        outcome.documents().len(),
                        start.elapsed(),
                        outcome.is_cached(),
                    );
                }
                output_documents(outcome.documents(), format)?;
            }
            Ok(())
        }
        Ok(outcome @ SearchOutcome::NoResults { .. }) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if let SearchOutcome::NoResults { message, .. } = &outcome {
                ui::print_status(Status::Info, message);
            }
            Ok(())
        }
        // A single CLI invocation runs one search, so this is not expected
        Ok(SearchOutcome::Superseded { .. }) => Ok(()),
        Err(e @ SearchError::Network(_)) => {
            tracing::debug!("Search failed: {:?}", e);
            ui::print_status(Status::Error, e.user_message());
            eprintln!("{}", "Check your connection and try again.".dimmed());
            std::process::exit(1);
        }
        Err(e @ SearchError::EmptyQuery) => bail!(e.user_message()),
    }
}

/// The `index`-th (1-based) cached result of `query`
fn select_cached(cache: &CacheService, query: &str, index: usize) -> Result<DocumentRecord> {
    let CacheResult::Hit(documents) = cache.get_search(query) else {
        bail!("No cached results for \"{}\". Run a search first.", query.trim());
    };

    match index.checked_sub(1).and_then(|i| documents.get(i)) {
        Some(document) => Ok(document.clone()),
        None => bail!(
            "Result {} does not exist; \"{}\" has {} results.",
            index,
            query.trim(),
            documents.len()
        ),
    }
}

fn output_documents(documents: &[DocumentRecord], format: OutputFormat) -> Result<()> {
    match format.resolve() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(documents)?),
        OutputFormat::Plain => print!("{}", documents_plain(documents)),
        _ => println!("{}", documents_table(documents, terminal_width())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use free_pdf_search::models::SourceLabel;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_parse_search_joins_words() {
        let cli = Cli::try_parse_from(["free-pdf-search", "-vv", "search", "quantum", "computing"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search { query } => assert_eq!(query.join(" "), "quantum computing"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_requires_query() {
        assert!(Cli::try_parse_from(["free-pdf-search", "search"]).is_err());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "free-pdf-search", "bookmarks", "add", "linear algebra", "2", "--no-cache", "--output", "json",
        ])
        .unwrap();
        assert!(cli.no_cache);
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Bookmarks { command: BookmarkCommands::Add { index: 2, .. } }
        ));
    }

    #[test]
    fn test_select_cached() {
        let cache = CacheService::new(Arc::new(MemoryStore::new()));
        let docs = vec![
            DocumentRecord::new("a", "First", "https://a.org/1.pdf", SourceLabel::Arxiv),
            DocumentRecord::new("b", "Second", "https://a.org/2.pdf", SourceLabel::Doaj),
        ];
        cache.set_search("Linear Algebra", &docs).unwrap();

        assert_eq!(select_cached(&cache, "linear algebra", 2).unwrap().title, "Second");
        assert!(select_cached(&cache, "linear algebra", 0).is_err());
        assert!(select_cached(&cache, "linear algebra", 3).is_err());
        assert!(select_cached(&cache, "topology", 1).is_err());
    }
}
