//! Error types for the Matrix core library
//!
//! This module defines the crate-level error used for construction and
//! configuration faults. Failures of individual service calls are described by
//! [`ApiError`](crate::http::ApiError), which converts into [`Error::Api`] when
//! the two need to travel together.

use thiserror::Error;

use crate::http::ApiError;

/// Main error type for Matrix client operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or out-of-range settings)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A URL in the configuration or a request could not be parsed
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The underlying HTTP transport could not be constructed
    #[error("HTTP client error: {message}")]
    HttpClient {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A classified failure from a service call
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the classified API error, if this is one
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ErrorKind;

    #[test]
    fn test_configuration_error_display() {
        let err = Error::configuration("timeout must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Configuration error: timeout must be greater than zero"
        );
        assert!(err.as_api().is_none());
    }

    #[test]
    fn test_api_error_is_transparent() {
        let api = ApiError::new(ErrorKind::ResourceNotFound, "no such app").with_status(404);
        let err: Error = api.clone().into();
        assert_eq!(err.to_string(), api.to_string());
        assert_eq!(err.as_api().map(|e| e.kind), Some(ErrorKind::ResourceNotFound));
    }

    #[test]
    fn test_invalid_url_error() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = Error::InvalidUrl {
            url: "not a url".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid URL 'not a url'"));
    }
}
