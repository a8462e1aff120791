//! Matrix CLI - command-line interface for the Matrix services
//!
//! This is the main entry point for the `matrix` binary, providing commands
//! for probing service health, inspecting the effective configuration and
//! issuing ad-hoc requests through the resilient client.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use matrix_core::{Config, MatrixClient};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    control::set_override(cli.use_color());

    let result = match config::load(cli.env_file.as_deref(), config::Overrides::from(&cli)) {
        Ok(config) => {
            if let Err(e) = init_logging(&cli, &config) {
                eprintln!("Failed to initialize logging: {}", e);
            }
            run(cli, config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");
    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "executing_command"
    );

    match cli.command {
        Commands::Info => handlers::handle_info(&config, &mut output),
        Commands::Health(args) => {
            let mut client = MatrixClient::new(config)?;
            let result = handlers::handle_health(args, &client, &mut output).await;
            client.close();
            result
        }
        Commands::Request(args) => {
            let mut client = MatrixClient::new(config)?;
            let result = handlers::handle_request(args, &client, &mut output).await;
            client.close();
            result
        }
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let verbosity = cli.verbosity_level();
    let mut logging_config = LoggingConfig::from_verbosity(verbosity);
    logging_config.merge_with_settings(verbosity, config.log_level, config.log_json);

    // Quiet mode only logs errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
