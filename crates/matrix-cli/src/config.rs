//! Configuration loading for the CLI
//!
//! Settings come from (highest precedence first):
//! 1. Command-line flags (`--log-level`, `--json-logs`)
//! 2. Process environment
//! 3. `--env-file`, or `./.env` when no file is given

use crate::cli::Cli;
use crate::error::Result;
use matrix_core::{Config, LogLevel};
use std::path::Path;

/// Flag overrides applied after the environment has been read
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub log_level: Option<LogLevel>,
    pub json_logs: bool,
}

impl From<&Cli> for Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            log_level: cli.log_level,
            json_logs: cli.json_logs,
        }
    }
}

/// Load the client configuration for this invocation
pub fn load(env_file: Option<&Path>, overrides: Overrides) -> Result<Config> {
    let config = match env_file {
        Some(path) => Config::from_env_file(path)?,
        None => Config::from_env()?,
    };
    Ok(apply_overrides(config, overrides))
}

fn apply_overrides(mut config: Config, overrides: Overrides) -> Config {
    if let Some(level) = overrides.log_level {
        config.log_level = level;
    }
    if overrides.json_logs {
        config.log_json = true;
    }
    config
}
