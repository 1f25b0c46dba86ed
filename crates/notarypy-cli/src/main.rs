//! NotaryPy CLI - PyPI attestation badges.
//!
//! Runs the badge gateway, answers serverless function events, resolves
//! single files from the terminal and inspects the layered configuration.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;

use commands::{config, function, resolve, serve};
use notarypy_config::{Config, ShowFormat};
use notarypy_core::BadgeRequest;
use notarypy_gateway::config_bridge;

/// NotaryPy - attestation badges for PyPI distribution files
#[derive(Parser)]
#[command(name = "notarypy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Extra configuration file, merged above the system and user files
    #[arg(short, long, global = true, env = "NOTARYPY_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Plain text (TOML for `config show`)
    #[value(alias = "toml")]
    Text,
    /// JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP badge gateway
    Serve {
        /// Address to listen on, overriding `gateway.bind`
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Look up one distribution file and print its badge URL
    Resolve {
        /// Package name
        package: String,
        /// Package version
        version: String,
        /// Distribution filename
        filename: String,
        /// Badge style passed through to the badge service
        #[arg(short, long)]
        style: Option<String>,
    },

    /// Read a function event from stdin and write the response to stdout
    Function,

    /// View and validate configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration with the source of each value
    Show {
        /// Only show one section (e.g. `index`)
        #[arg(short, long)]
        section: Option<String>,
    },
    /// Check that the configuration loads and validates
    Validate,
    /// List the files and environment variables consulted
    Paths,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(cli.config.as_deref());

    // Set up logging from config, with --verbose override.
    let mut log_config = match &loaded {
        Ok(resolved) => config_bridge::to_log_config(&resolved.config),
        Err(_) => notarypy_telemetry::LogConfig::new("info"),
    };
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = notarypy_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Serve { bind } => {
            serve::run_serve(&loaded?.config, bind.as_deref()).await?;
        },
        Commands::Resolve {
            package,
            version,
            filename,
            style,
        } => {
            let request = BadgeRequest::try_new(package, version, filename)?.with_style(style);
            resolve::run_resolve(&loaded?.config, request, cli.format).await?;
        },
        Commands::Function => {
            function::run_function(&loaded?.config).await?;
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show { section } => {
                let format = match cli.format {
                    OutputFormat::Json => ShowFormat::Json,
                    OutputFormat::Text => ShowFormat::Toml,
                };
                config::show_config(&loaded?, format, section.as_deref())?;
            },
            ConfigCommands::Validate => config::validate_config(&loaded)?,
            ConfigCommands::Paths => config::show_paths(cli.config.as_deref())?,
        },
    }

    Ok(())
}
