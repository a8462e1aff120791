//! HTTP client implementation for Matrix service communication
//!
//! This module provides a resilient HTTP client with:
//! - Connection ownership with guaranteed release
//! - Bearer authentication and standard headers
//! - Response classification into a closed error taxonomy
//! - Bounded, immediate retry of connection failures and timeouts

pub mod auth;
pub mod classifier;
pub mod client;
pub mod connection;
pub mod error;
pub mod request;
pub mod retry;

pub use auth::{AuthHandler, AuthInjector, BearerAuth, AUTH_HINT, CLIENT_USER_AGENT};
pub use classifier::{Classified, ResponseClassifier};
pub use client::{MatrixClient, RequestOptions};
pub use connection::Connection;
pub use error::{ApiError, ErrorKind};
pub use request::{execute_once, HttpMethod, RawOutcome, RawResponse, Request};
pub use retry::{
    execute_with_retry, AttemptState, RetryController, RetryDecision, RetryPolicy, RetryState,
};

// Re-export commonly used types
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
