//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use matrix_core::ErrorKind;
use std::io;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (writing output, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from matrix-core, including classified service failures
    #[error("{0}")]
    Core(#[from] matrix_core::Error),

    /// Invalid argument value or combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// One or more health probes failed
    #[error("{failed} of {total} health checks failed")]
    HealthCheckFailed { failed: usize, total: usize },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(core) => match core {
                matrix_core::Error::Configuration { .. } | matrix_core::Error::InvalidUrl { .. } => 5,
                matrix_core::Error::HttpClient { .. } => 10,
                matrix_core::Error::Api(api) => match api.kind {
                    ErrorKind::ConnectionFailure => 10,
                    ErrorKind::Timeout => 11,
                    ErrorKind::AuthenticationFailure => 20,
                    ErrorKind::ResourceNotFound => 21,
                    ErrorKind::ValidationFailure => 22,
                    ErrorKind::RateLimited => 23,
                    ErrorKind::GenericApiFailure | ErrorKind::DecodeFailure => 2,
                },
            },
            Self::InvalidArgs(_) => 6,
            Self::HealthCheckFailed { .. } => 3,
            Self::Json(_) => 12,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let label = match error {
        Error::Core(matrix_core::Error::Api(api)) => format!("Error ({}):", api.kind),
        _ => "Error:".to_string(),
    };

    if use_color {
        use colored::Colorize;
        format!("{} {}", label.red().bold(), error)
    } else {
        format!("{} {}", label, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_core::ApiError;

    fn api(kind: ErrorKind) -> Error {
        Error::Core(matrix_core::Error::Api(ApiError::new(kind, "boom")))
    }

    #[test]
    fn test_exit_codes_distinguish_kinds() {
        assert_eq!(api(ErrorKind::ConnectionFailure).exit_code(), 10);
        assert_eq!(api(ErrorKind::Timeout).exit_code(), 11);
        assert_eq!(api(ErrorKind::AuthenticationFailure).exit_code(), 20);
        assert_eq!(api(ErrorKind::DecodeFailure).exit_code(), 2);
        assert_eq!(
            Error::Core(matrix_core::Error::configuration("bad")).exit_code(),
            5
        );
        assert_eq!(Error::HealthCheckFailed { failed: 1, total: 3 }.exit_code(), 3);
    }

    #[test]
    fn test_format_error_plain() {
        let err = Error::Core(matrix_core::Error::Api(
            ApiError::new(ErrorKind::ResourceNotFound, "no such app").with_status(404),
        ));
        let formatted = format_error(&err, false);
        assert!(formatted.starts_with("Error (resource_not_found):"));
        assert!(formatted.contains("no such app"));
    }

    #[test]
    fn test_help_only_for_invalid_args() {
        assert!(Error::invalid_args("bad header").should_show_help());
        assert!(!Error::other("x").should_show_help());
    }
}
