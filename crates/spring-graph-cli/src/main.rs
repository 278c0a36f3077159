//! Spring-Graph CLI - force-directed layout for JSON graph documents.
//!
//! Reads `{ "nodes": [...], "edges": [...] }`, runs the spring simulation in
//! the background, and prints normalized coordinates.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

mod commands;
mod config;
mod document;

use commands::config as config_cmd;
use commands::layout::{self, LayoutOptions, OutputFormat};
use config::Config;

/// Spring-Graph CLI - lay out a graph with a spring simulation.
#[derive(Parser, Debug)]
#[command(
    name = "sg",
    author,
    version,
    about = "Spring-Graph: force-directed graph layout",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Lay out a graph document and print the final coordinates.
    Layout {
        /// Path to the graph JSON document.
        graph: PathBuf,

        /// Print each progress snapshot as a JSON line.
        #[arg(long)]
        stream: bool,

        /// Output format: json or table.
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Width of the output space.
        #[arg(long)]
        width: Option<f64>,

        /// Height of the output space.
        #[arg(long)]
        height: Option<f64>,

        /// Wall-clock budget in seconds.
        #[arg(long)]
        max_seconds: Option<f64>,

        /// Iteration ceiling.
        #[arg(long)]
        max_iterations: Option<u64>,

        /// Fraction of the output size to use, in (0, 1].
        #[arg(long)]
        margin: Option<f64>,

        /// Write the final layout to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
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

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN // Default to less noise
    };

    // Coordinates go to stdout; diagnostics stay on stderr.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Layout {
            graph,
            stream,
            format,
            width,
            height,
            max_seconds,
            max_iterations,
            margin,
            output,
        } => {
            let config = Config::load()?;
            let format: OutputFormat = format.parse()?;
            let options = LayoutOptions {
                graph,
                stream,
                format,
                width,
                height,
                max_seconds,
                max_iterations,
                margin,
                output,
            };
            layout::execute(config, options).await?;
        }

        Commands::Config(config_cmd_inner) => match config_cmd_inner {
            ConfigCommands::Show => {
                config_cmd::show(&Config::load()?)?;
            }
            ConfigCommands::Set { key, value } => {
                // Persist only what the file holds, not environment overrides.
                let mut config = Config::load_file()?;
                config_cmd::set(&mut config, &key, &value)?;
            }
            ConfigCommands::Get { key } => {
                config_cmd::get(&Config::load()?, &key)?;
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
        },
    }

    Ok(())
}
