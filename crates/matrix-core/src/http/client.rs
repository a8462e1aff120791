//! Unified HTTP client orchestrating all components
//!
//! Provides a high-level interface for making authenticated, retryable
//! requests to the Matrix services. Each call runs
//! auth injection → single attempt → classification under the retry
//! controller, and resolves to a decoded JSON payload or one typed error.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::config::{Config, Service};
use crate::http::auth::{loggable_headers, AuthInjector};
use crate::http::classifier::ResponseClassifier;
use crate::http::connection::Connection;
use crate::http::error::ErrorKind;
use crate::http::request::{execute_once, HttpMethod, Request};
use crate::http::retry::{execute_with_retry, RetryController, RetryPolicy};
use crate::{Error, Result};

/// Per-call extras: additional headers and an optional JSON body
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Resilient client for the Matrix Hub, AI and Guardian services
///
/// The connection pool is opened in the constructor and released by
/// [`MatrixClient::close`] or on drop, whichever comes first. Calls take
/// `&self`, so one client may serve concurrent calls; each call keeps its own
/// retry bookkeeping.
pub struct MatrixClient {
    config: Arc<Config>,
    connection: Connection,
    auth: AuthInjector,
    classifier: ResponseClassifier,
    policy: RetryPolicy,
}

impl MatrixClient {
    /// Create a client that owns its configuration
    pub fn new(config: Config) -> Result<Self> {
        Self::with_shared_config(Arc::new(config))
    }

    /// Create a client over a configuration shared with other clients
    pub fn with_shared_config(config: Arc<Config>) -> Result<Self> {
        config.validate()?;
        let connection = Connection::open(config.timeout)?;
        let auth = AuthInjector::bearer(config.api_token().map(str::to_string));
        let classifier = ResponseClassifier::new(auth.missing_token_hint());
        let policy = RetryPolicy::new(config.max_retries);

        Ok(Self {
            config,
            connection,
            auth,
            classifier,
            policy,
        })
    }

    /// Create with configuration loaded from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    /// Release the connection pool; safe to call more than once
    pub fn close(&mut self) {
        self.connection.close();
    }

    /// Make a request with automatic retry and error handling
    #[tracing::instrument(skip(self, options))]
    pub async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        options: RequestOptions,
    ) -> Result<Value> {
        let url = Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let headers = self.auth.headers(&options.headers);

        tracing::debug!(
            method = %method,
            url = %url,
            headers = ?loggable_headers(&headers),
            "http_request"
        );

        let request = Request::new(method, url, headers, options.body);
        let transport = self.connection.transport()?;
        let controller = RetryController::new(
            self.policy,
            request.url.as_str(),
            self.connection.timeout(),
        );

        let request_ref = &request;
        let classifier = &self.classifier;
        let result = execute_with_retry(controller, move |_| async move {
            classifier.classify(&execute_once(transport, request_ref).await)
        })
        .await;

        result.map_err(|error| {
            if let Some(status_code) = error.status_code {
                tracing::error!(
                    status_code,
                    message = %error.message,
                    url = %request.url,
                    "http_error"
                );
            }
            if error.kind == ErrorKind::RateLimited {
                if let Some(retry_after) = error.retry_after {
                    tracing::warn!(
                        retry_after = retry_after.as_secs(),
                        url = %request.url,
                        "rate_limited"
                    );
                }
            }
            Error::Api(error)
        })
    }

    pub async fn get(&self, url: &str) -> Result<Value> {
        self.request(HttpMethod::Get, url, RequestOptions::new()).await
    }

    pub async fn post(&self, url: &str, body: Value) -> Result<Value> {
        self.request(HttpMethod::Post, url, RequestOptions::new().json(body))
            .await
    }

    pub async fn put(&self, url: &str, body: Value) -> Result<Value> {
        self.request(HttpMethod::Put, url, RequestOptions::new().json(body))
            .await
    }

    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.request(HttpMethod::Delete, url, RequestOptions::new())
            .await
    }

    /// `<service-base-url>/<path>`
    pub fn service_url(&self, service: Service, path: &str) -> Result<Url> {
        self.config.service_url(service, path)
    }

    /// Probe `GET <service-base-url>/health`
    pub async fn health_check(&self, service: Service) -> Result<Value> {
        let url = self.service_url(service, "health")?;
        self.get(url.as_str()).await
    }
}

impl std::fmt::Debug for MatrixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixClient")
            .field("config", &self.config)
            .field("open", &self.connection.is_open())
            .field("policy", &self.policy)
            .finish()
    }
}
