//! Matrix Core - resilient client for the Matrix Hub, AI and Guardian services
//!
//! This crate provides the request pipeline shared by every Matrix tool:
//! connect, authenticate, send, classify the outcome, and retry transient
//! faults a bounded number of times.
//!
//! # Main Components
//!
//! - **Configuration**: Service URLs, token, timeout and retry budget from env and `.env`
//! - **Error Handling**: Typed `ApiError` with a closed `ErrorKind` taxonomy
//! - **HTTP**: Connection ownership, auth injection, classification and retry
//!
//! # Example
//!
//! ```no_run
//! use matrix_core::{Config, MatrixClient, Result, Service};
//!
//! async fn example() -> Result<()> {
//!     let client = MatrixClient::new(Config::from_env()?)?;
//!     let health = client.health_check(Service::Hub).await?;
//!     println!("{}", health);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;

pub use config::{Config, ConfigBuilder, LogLevel, Service};
pub use error::{Error, Result};
pub use http::{ApiError, ErrorKind, HttpMethod, MatrixClient, RequestOptions};

/// Crate version reported by tools built on this client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_matches_user_agent() {
        assert!(http::CLIENT_USER_AGENT.ends_with(VERSION));
    }
}
