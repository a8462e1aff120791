//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod health;
mod info;
mod request;

pub use health::handle_health;
pub use info::handle_info;
pub use request::handle_request;
