//! elemgraph CLI - name element graphs and maintain their changed-at index.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::config as config_cmd;
use config::Config;

/// elemgraph CLI - reference-driven naming and incremental indexing.
#[derive(Parser, Debug)]
#[command(
    name = "eg",
    author,
    version,
    about = "elemgraph: reference-driven naming and changed-at indexing",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Rename instances of a graph document from their references.
    Resolve {
        /// Graph document (JSON).
        graph: PathBuf,

        /// Naming configuration (JSON). Falls back to the configured file.
        #[arg(short, long)]
        naming: Option<PathBuf>,

        /// Write the renamed graph here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show which instances reference each nameable instance.
    Refs {
        /// Graph document (JSON).
        graph: PathBuf,

        /// Naming configuration (JSON). Falls back to the configured file.
        #[arg(short, long)]
        naming: Option<PathBuf>,

        /// Print the index as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Maintain the changed-at index.
    #[command(subcommand)]
    Index(IndexCommands),

    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Changed-at index commands.
#[derive(Subcommand, Debug)]
enum IndexCommands {
    /// Apply a change set (JSON list of changes).
    Apply {
        /// Change set document.
        changes: PathBuf,

        /// Graph document with every current element, used for rebuilds.
        #[arg(short, long)]
        graph: PathBuf,

        /// Treat the cache as invalid and re-index.
        #[arg(long)]
        invalid_cache: bool,

        /// Store root (overrides EG_STORE_DIR).
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// List indexed ids.
    Query {
        /// Lowest key to include.
        #[arg(long)]
        from: Option<String>,

        /// Highest key to include.
        #[arg(long)]
        to: Option<String>,

        /// Store root (overrides EG_STORE_DIR).
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Reset configuration to defaults.
    Reset,

    /// Show path to config file.
    Path,
}

fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = Config::load()?;

    match cli.command {
        Commands::Resolve {
            graph,
            naming,
            output,
        } => {
            let naming = config.naming(naming.as_deref())?;
            commands::resolve::execute(&graph, naming, output)?;
        }

        Commands::Refs {
            graph,
            naming,
            json,
        } => {
            let naming = config.naming(naming.as_deref())?;
            commands::refs::execute(&graph, &naming, json)?;
        }

        Commands::Index(index_cmd) => match index_cmd {
            IndexCommands::Apply {
                changes,
                graph,
                invalid_cache,
                store,
            } => {
                let store = store.unwrap_or_else(|| config.store_dir.clone());
                commands::index::apply(&store, &changes, &graph, !invalid_cache).await?;
            }

            IndexCommands::Query { from, to, store } => {
                let store = store.unwrap_or_else(|| config.store_dir.clone());
                commands::index::query(&store, from.as_deref(), to.as_deref()).await?;
            }
        },

        Commands::Config(config_cmd_inner) => {
            let mut config = config;
            match config_cmd_inner {
                ConfigCommands::Show => {
                    config_cmd::show(&config)?;
                }
                ConfigCommands::Set { key, value } => {
                    config_cmd::set(&mut config, &key, &value)?;
                }
                ConfigCommands::Get { key } => {
                    config_cmd::get(&config, &key)?;
                }
                ConfigCommands::Reset => {
                    config_cmd::reset()?;
                }
                ConfigCommands::Path => {
                    if let Some(path) = Config::config_file_path() {
                        println!("{}", path.display());
                    } else {
                        println!("(no config file path available)");
                    }
                }
            }
        }
    }

    Ok(())
}
