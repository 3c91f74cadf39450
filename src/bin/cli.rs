//! Site search CLI
//!
//! Local entry point replacing an HTTP front end: every command prints the
//! JSON response of the matching indexing operation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use site_search::{
    error::Result,
    models::{ApiResponse, Config},
    pipeline::IndexingService,
};

/// Crawl configured sites and search them
#[derive(Parser, Debug)]
#[command(name = "site-search", version, about = "Site crawler and lemma search engine")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the index of every configured site (Ctrl-C stops)
    Crawl,

    /// Fetch and index a single page of a configured site
    IndexPage {
        /// Absolute page URL
        url: String,
    },

    /// Search the index
    Search {
        /// Query text
        query: String,

        /// Restrict to one configured site
        #[arg(long)]
        site: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Defaults to `search.default_limit`
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show page and lemma counts per site
    Stats,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_response<T: Serialize>(response: &ApiResponse<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    if let Some(message) = response.message() {
        log::warn!("{}", message);
    }
    Ok(())
}

/// Runs synchronously: the service owns its runtimes and blocks on them.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("Config OK ({} sites)", config.sites.len());
        return Ok(());
    }

    config.validate()?;
    let service = Arc::new(IndexingService::new(config)?);

    match cli.command {
        Command::Crawl => {
            service.stop_on_ctrl_c();
            print_response(&service.start_indexing())?;
        }
        Command::IndexPage { url } => {
            print_response(&service.index_page(&url))?;
        }
        Command::Search {
            query,
            site,
            offset,
            limit,
        } => {
            print_response(&service.search(&query, site.as_deref(), offset, limit))?;
        }
        Command::Stats => {
            print_response(&service.statistics())?;
        }
        Command::Validate => {}
    }

    Ok(())
}
