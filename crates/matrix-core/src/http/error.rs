//! Typed failures of a service call
//!
//! Every terminal path of a call yields exactly one [`ApiError`], tagged with an
//! [`ErrorKind`] so callers can branch on the failure without string matching.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Closed taxonomy of call failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// DNS failure, refused or reset connection, other transport faults
    ConnectionFailure,
    /// No response within the per-attempt deadline
    Timeout,
    /// 401 or 403
    AuthenticationFailure,
    /// 404
    ResourceNotFound,
    /// 422, response body preserved
    ValidationFailure,
    /// 429, optional `Retry-After`
    RateLimited,
    /// Any other status >= 400
    GenericApiFailure,
    /// A success status whose body is not valid JSON
    DecodeFailure,
}

impl ErrorKind {
    /// Transient faults are eligible for automatic retry; nothing else is
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::ConnectionFailure | ErrorKind::Timeout)
    }

    /// Stable snake_case name, used in logs and JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConnectionFailure => "connection_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::AuthenticationFailure => "authentication_failure",
            ErrorKind::ResourceNotFound => "resource_not_found",
            ErrorKind::ValidationFailure => "validation_failure",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::GenericApiFailure => "generic_api_failure",
            ErrorKind::DecodeFailure => "decode_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure of a service call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// HTTP status code if a response was received
    pub status_code: Option<u16>,
    /// Decoded JSON error body, when the server sent one
    pub response_data: Option<Value>,
    /// Server-requested wait before re-issuing (rate limits only)
    #[serde(rename = "retry_after_secs", with = "duration_secs", default)]
    pub retry_after: Option<Duration>,
    /// Number of attempts made (transport failures only)
    pub attempts: Option<u32>,
}

impl ApiError {
    /// Create an error of the given kind with no status or payload
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            response_data: None,
            retry_after: None,
            attempts: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_response_data(mut self, data: Option<Value>) -> Self {
        self.response_data = data;
        self
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Whether the retry controller may re-issue the request
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "[{}] {}", status, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// `Option<Duration>` as whole seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}
