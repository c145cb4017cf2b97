//! fk-reviews - Flipkart customer review scraper
//!
//! Command-line front end: one query in, a review table and a CSV file out.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fk_reviews::commands::ReviewCommand;
use fk_reviews::config::{Config, OutputFormat};
use fk_reviews::format::Formatter;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fk-reviews",
    version,
    about = "Fetch Flipkart customer reviews for a search query",
    long_about = "Searches Flipkart, opens the first product result and saves its customer reviews as CSV."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Directory for the per-query CSV files
    #[arg(short, long, global = true, env = "FK_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Site root to search (e.g., a local mirror)
    #[arg(long, global = true, env = "FK_BASE_URL")]
    base_url: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "FK_PROXY")]
    proxy: Option<String>,

    /// Number of leading search results to skip
    #[arg(long, global = true)]
    skip_listings: Option<usize>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape reviews for the first product matching a query
    #[command(alias = "r")]
    Review {
        /// Search query (whitespace is removed)
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Print the selector table in effect
    Selectors,
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(skip) = cli.skip_listings {
        config.skip_listings = skip;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file;
    }

    init_logging(cli.verbose, config.log_file.as_deref())?;

    match cli.command {
        Commands::Review { query } => {
            let format = config.format;
            let cmd = ReviewCommand::new(config).context("Invalid selector configuration")?;

            let response = cmd.respond(&query.join(" ")).await;
            println!("{}", Formatter::new(format).format_response(&response));

            if !response.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Selectors => {
            let table = toml::to_string_pretty(&config.selectors)
                .context("Failed to serialize selector table")?;
            println!("{}", table);
        }
    }

    Ok(ExitCode::SUCCESS)
}
