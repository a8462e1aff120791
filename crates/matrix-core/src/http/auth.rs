//! Authentication and standard header injection
//!
//! Every outgoing request carries:
//! - `Content-Type: application/json` and `Accept: application/json`
//! - `User-Agent: matrix-system/<version>`
//! - `Authorization: Bearer <token>` when a token is configured
//!
//! A missing token is not an error at this layer. It only matters once a
//! service answers 401/403, and then the classifier appends [`AUTH_HINT`].

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use std::collections::BTreeMap;

/// Identifying string sent as `User-Agent`
pub const CLIENT_USER_AGENT: &str = concat!("matrix-system/", env!("CARGO_PKG_VERSION"));

/// Remediation hint appended to authentication failures when no token is set
pub const AUTH_HINT: &str = " (token missing: set MATRIX_HUB_TOKEN / MATRIX_TOKEN / API_TOKEN \
for operator/admin endpoints like install/remotes/ingest)";

/// Trait for handling service authentication
pub trait AuthHandler: Send + Sync {
    /// Apply authentication to request headers
    fn apply_auth(&self, headers: &mut HeaderMap);

    /// Whether credentials are available at all
    fn has_credentials(&self) -> bool;
}

/// Bearer token authentication
#[derive(Clone, Default)]
pub struct BearerAuth {
    token: Option<String>,
}

impl BearerAuth {
    /// Create from an optional token; empty strings count as absent
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl AuthHandler for BearerAuth {
    fn apply_auth(&self, headers: &mut HeaderMap) {
        let Some(token) = &self.token else {
            return;
        };
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!("api token contains characters not allowed in a header; not sent");
            }
        }
    }

    fn has_credentials(&self) -> bool {
        self.token.is_some()
    }
}

/// Builds the header set for every request
pub struct AuthInjector {
    handler: Box<dyn AuthHandler>,
}

impl AuthInjector {
    pub fn new(handler: Box<dyn AuthHandler>) -> Self {
        Self { handler }
    }

    /// Injector for an optional bearer token
    pub fn bearer(token: Option<String>) -> Self {
        Self::new(Box::new(BearerAuth::new(token)))
    }

    /// Merge caller headers with the standard set
    ///
    /// Caller headers are kept, but the standard headers replace any caller
    /// value under the same name and `Authorization` always comes from the
    /// auth handler.
    pub fn headers(&self, extra: &HeaderMap) -> HeaderMap {
        let mut headers = extra.clone();
        headers.remove(AUTHORIZATION);

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        self.handler.apply_auth(&mut headers);
        headers
    }

    pub fn has_credentials(&self) -> bool {
        self.handler.has_credentials()
    }

    /// Hint to append to a 401/403 message, if one applies
    pub fn missing_token_hint(&self) -> Option<&'static str> {
        (!self.has_credentials()).then_some(AUTH_HINT)
    }
}

/// Headers as a loggable map, `Authorization` left out
pub fn loggable_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| **name != AUTHORIZATION)
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect()
}
