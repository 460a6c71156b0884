//! # Civilization Library CLI (`civlib`)
//!
//! Query the offline archive server from the terminal, inspect its
//! catalog, and serve the retrieval tools to agents.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `civlib search "<query>"` | Run the retrieval pipeline and print the text block |
//! | `civlib catalog` | List every archive in the server catalog |
//! | `civlib resolve <name>` | Resolve a partial title to an archive ID |
//! | `civlib topics` | Show the context → catalog keyword table |
//! | `civlib check` | Connectivity smoke test against the server |
//! | `civlib serve mcp` | Start the HTTP tool server with the MCP endpoint |
//!
//! ## Examples
//!
//! ```bash
//! civlib search "headlight replacement" --context repair
//! civlib search "radio frequency; antenna types"
//! civlib --host http://localhost:8080 catalog
//! civlib -vv resolve wikipedia
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use civ_library::config::{self, Config};
use civ_library::retrieve::Library;
use civ_library::{server, sources};

const DEFAULT_CONFIG_PATH: &str = "./config/civlib.toml";

/// Civilization Library CLI: offline knowledge retrieval for AI agents.
#[derive(Parser)]
#[command(
    name = "civlib",
    about = "Civilization Library: offline knowledge retrieval for AI agents",
    version,
    long_about = "Searches a locally hosted ZIM archive server (Wikipedia, Stack Overflow, \
    iFixit, ...), re-ranks results by topic, and returns article text ready for a language model."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/civlib.toml`; built-in defaults apply when that
    /// file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Archive server base address. Overrides `CIV_LIBRARY_HOST` and the config file.
    #[arg(long, global = true)]
    host: Option<String>,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the offline library and print article text.
    ///
    /// Separate several queries with ';' to run them independently.
    Search {
        /// Search terms, e.g. "Python list comprehension".
        query: String,

        /// Topic hint: general, code, repair, medical, linux, science, books,
        /// or any catalog keyword.
        #[arg(long)]
        context: Option<String>,
    },

    /// List every archive in the server catalog.
    Catalog,

    /// Resolve a partial archive title to its identifier.
    Resolve {
        /// Case-insensitive part of the archive title, e.g. `ifixit`.
        name: String,
    },

    /// Show how contexts map to catalog keywords.
    Topics,

    /// Check that the archive server is reachable.
    Check,

    /// Start a server.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

#[derive(Subcommand)]
enum ServeService {
    /// Start the HTTP tool server (JSON API + MCP endpoint).
    ///
    /// Binds to `[server].bind`.
    Mcp,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let cfg = match &cli.config {
        Some(path) => config::load_or_default(path, true)?,
        None => config::load_or_default(&PathBuf::from(DEFAULT_CONFIG_PATH), false)?,
    };
    let cfg = cfg.with_host_override(cli.host.as_deref());
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        // Needs no config or network
        Commands::Topics => sources::list_topics(),
        Commands::Search { query, context } => {
            let cfg = load_config(&cli)?;
            let context = context
                .clone()
                .unwrap_or_else(|| cfg.retrieval.default_context.clone());
            let library = Library::from_config(&cfg)?;
            println!("{}", library.search_knowledge_base(query, &context));
        }
        Commands::Catalog => {
            sources::run_catalog(&load_config(&cli)?)?;
        }
        Commands::Resolve { name } => {
            sources::run_resolve(&load_config(&cli)?, name)?;
        }
        Commands::Check => {
            sources::run_check(&load_config(&cli)?)?;
        }
        Commands::Serve { service } => match service {
            ServeService::Mcp => {
                let cfg = load_config(&cli)?;
                let runtime =
                    tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
                runtime.block_on(server::run_server(&cfg))?;
            }
        },
    }

    Ok(())
}
