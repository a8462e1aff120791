//! Ownership of the pooled HTTP transport
//!
//! A [`Connection`] is opened once per client and released exactly once,
//! either by an explicit [`Connection::close`] or when it is dropped.

use reqwest::redirect::Policy;
use std::time::Duration;

use crate::http::error::{ApiError, ErrorKind};
use crate::{Error, Result};

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Holds the connection pool for the lifetime of a client
#[derive(Debug)]
pub struct Connection {
    client: Option<reqwest::Client>,
    timeout: Duration,
}

impl Connection {
    /// Build the pooled transport with a per-attempt timeout
    pub fn open(timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than zero"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| Error::HttpClient {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        tracing::debug!(timeout_secs = timeout.as_secs_f64(), "http_client_opened");
        Ok(Self {
            client: Some(client),
            timeout,
        })
    }

    /// The live transport, or a connection failure once closed
    pub fn transport(&self) -> std::result::Result<&reqwest::Client, ApiError> {
        self.client.as_ref().ok_or_else(|| {
            ApiError::new(ErrorKind::ConnectionFailure, "HTTP client has been closed")
        })
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Release the pool; further calls are no-ops
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("http_client_closed");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
