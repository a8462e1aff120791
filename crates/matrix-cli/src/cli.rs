//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use matrix_core::{HttpMethod, LogLevel, Service};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Matrix CLI - talk to the Matrix Hub, AI and Guardian services
///
/// Probes service health, shows the effective configuration and issues
/// ad-hoc requests through the resilient client.
#[derive(Parser, Debug)]
#[command(
    name = "matrix",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL); overrides LOG_LEVEL
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Emit logs as JSON lines; overrides LOG_JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Read settings from this env file instead of ./.env
    #[arg(long, global = true, env = "MATRIX_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the /health endpoint of one or all services
    Health(HealthArgs),

    /// Show version and effective configuration
    Info,

    /// Issue one request through the resilient client
    Request(RequestArgs),
}

/// Arguments for the health command
#[derive(Parser, Debug)]
pub struct HealthArgs {
    /// Service to probe
    #[arg(short, long, value_enum, default_value = "all")]
    pub service: ServiceSelection,
}

/// Arguments for the request command
#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, DELETE)
    #[arg(value_name = "METHOD")]
    pub method: HttpMethod,

    /// Absolute URL to call
    #[arg(value_name = "URL")]
    pub url: String,

    /// JSON request body
    #[arg(short, long, value_name = "JSON")]
    pub data: Option<String>,

    /// Extra header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,
}

/// Which services a health probe covers
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ServiceSelection {
    Hub,
    Ai,
    Guardian,
    /// Every service, in order
    All,
}

impl ServiceSelection {
    pub fn services(self) -> Vec<Service> {
        match self {
            ServiceSelection::Hub => vec![Service::Hub],
            ServiceSelection::Ai => vec![Service::Ai],
            ServiceSelection::Guardian => vec![Service::Guardian],
            ServiceSelection::All => Service::ALL.to_vec(),
        }
    }
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
