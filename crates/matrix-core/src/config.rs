//! Client configuration
//!
//! This module handles loading configuration from:
//! - Default values
//! - A `.env` file (optional)
//! - Environment variables (take precedence over the file)
//!
//! Names are matched case-insensitively. The bearer token is accepted under
//! several aliases; the first non-empty one wins.
//!
//! A [`Config`] is an immutable value: build it once and hand it (usually as
//! an `Arc<Config>`) to every client that needs it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::{Error, Result};

pub const DEFAULT_HUB_URL: &str = "https://api.matrixhub.io";
pub const DEFAULT_AI_URL: &str = "https://huggingface.co/spaces/agent-matrix/matrix-ai";
pub const DEFAULT_GUARDIAN_URL: &str = "http://localhost:8080";

/// Environment names accepted for the bearer token, in priority order
pub const TOKEN_ENV_ALIASES: [&str; 3] = ["MATRIX_HUB_TOKEN", "MATRIX_TOKEN", "API_TOKEN"];

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// The three backend services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Hub,
    Ai,
    Guardian,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::Hub, Service::Ai, Service::Guardian];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Hub => "hub",
            Service::Ai => "ai",
            Service::Guardian => "guardian",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Service {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hub" => Ok(Service::Hub),
            "ai" => Ok(Service::Ai),
            "guardian" => Ok(Service::Guardian),
            _ => Err(Error::configuration(format!(
                "Invalid service: {}. Must be one of hub, ai, guardian",
                s
            ))),
        }
    }
}

/// Log verbosity carried in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Equivalent `tracing` filter directive
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(Error::configuration(format!(
                "Invalid log level: {}. Must be one of DEBUG, INFO, WARNING, ERROR, CRITICAL",
                s
            ))),
        }
    }
}

/// Immutable client configuration
#[derive(Clone, Serialize)]
pub struct Config {
    pub hub_url: Url,
    pub ai_url: Url,
    pub guardian_url: Url,
    #[serde(skip_serializing)]
    api_token: Option<String>,
    /// Per-attempt deadline
    pub timeout: Duration,
    /// Retries after the first attempt for transient faults
    pub max_retries: u32,
    pub log_level: LogLevel,
    pub log_json: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hub_url", &self.hub_url.as_str())
            .field("ai_url", &self.ai_url.as_str())
            .field("guardian_url", &self.guardian_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_url: Url::parse(DEFAULT_HUB_URL).expect("Valid default hub URL"),
            ai_url: Url::parse(DEFAULT_AI_URL).expect("Valid default AI URL"),
            guardian_url: Url::parse(DEFAULT_GUARDIAN_URL).expect("Valid default guardian URL"),
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            log_level: LogLevel::default(),
            log_json: false,
        }
    }
}

impl Config {
    /// Start a builder from the defaults
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Load from `./.env` (if present) and the process environment
    pub fn from_env() -> Result<Self> {
        let dotenv_path = Path::new(".env");
        let file = if dotenv_path.exists() {
            read_env_file(dotenv_path)?
        } else {
            HashMap::new()
        };
        Self::from_sources(process_env, &file)
    }

    /// Load from a specific env file and the process environment
    pub fn from_env_file(path: &Path) -> Result<Self> {
        let file = read_env_file(path)?;
        Self::from_sources(process_env, &file)
    }

    /// Load from an arbitrary lookup, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_sources(lookup, &HashMap::new())
    }

    /// Environment lookup first, then file entries
    fn from_sources<F>(env: F, file: &HashMap<String, String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| -> Option<String> {
            env(name)
                .or_else(|| lookup_ci(file, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut builder = ConfigBuilder::new();
        if let Some(url) = get("MATRIX_HUB_URL") {
            builder = builder.hub_url(url);
        }
        if let Some(url) = get("MATRIX_AI_URL") {
            builder = builder.ai_url(url);
        }
        if let Some(url) = get("MATRIX_GUARDIAN_URL") {
            builder = builder.guardian_url(url);
        }
        if let Some(token) = TOKEN_ENV_ALIASES.iter().find_map(|&name| get(name)) {
            builder = builder.api_token(token);
        }
        if let Some(raw) = get("TIMEOUT") {
            let secs = parse_bounded::<u64>("TIMEOUT", &raw, 1, MAX_TIMEOUT_SECS)?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(raw) = get("MAX_RETRIES") {
            builder = builder.max_retries(parse_bounded::<u32>("MAX_RETRIES", &raw, 0, MAX_RETRIES_LIMIT)?);
        }
        if let Some(raw) = get("LOG_LEVEL") {
            builder = builder.log_level(raw.parse()?);
        }
        if let Some(raw) = get("LOG_JSON") {
            builder = builder.log_json(parse_bool("LOG_JSON", &raw)?);
        }
        builder.build()
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    pub fn base_url(&self, service: Service) -> &Url {
        match service {
            Service::Hub => &self.hub_url,
            Service::Ai => &self.ai_url,
            Service::Guardian => &self.guardian_url,
        }
    }

    /// `<base-url>/<path>`, keeping any path prefix of the base URL
    pub fn service_url(&self, service: Service, path: &str) -> Result<Url> {
        let base = self.base_url(service).as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|source| Error::InvalidUrl {
            url: joined,
            source,
        })
    }

    /// Check the invariants every constructor must uphold
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than zero"));
        }
        if self.timeout > Duration::from_secs(MAX_TIMEOUT_SECS) {
            return Err(Error::configuration(format!(
                "timeout must be at most {} seconds",
                MAX_TIMEOUT_SECS
            )));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(Error::configuration(format!(
                "max_retries must be at most {}",
                MAX_RETRIES_LIMIT
            )));
        }
        for service in Service::ALL {
            let url = self.base_url(service);
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::configuration(format!(
                    "{} URL must use http or https, got '{}'",
                    service, url
                )));
            }
        }
        Ok(())
    }
}

/// Builder for creating configurations programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    hub_url: Option<String>,
    ai_url: Option<String>,
    guardian_url: Option<String>,
    api_token: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    log_level: Option<LogLevel>,
    log_json: Option<bool>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hub_url(mut self, url: impl Into<String>) -> Self {
        self.hub_url = Some(url.into());
        self
    }

    pub fn ai_url(mut self, url: impl Into<String>) -> Self {
        self.ai_url = Some(url.into());
        self
    }

    pub fn guardian_url(mut self, url: impl Into<String>) -> Self {
        self.guardian_url = Some(url.into());
        self
    }

    /// Same base URL for all three services (handy against a single mock)
    pub fn all_urls(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.hub_url(url.clone()).ai_url(url.clone()).guardian_url(url)
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn log_json(mut self, enabled: bool) -> Self {
        self.log_json = Some(enabled);
        self
    }

    /// Parse URLs and validate the result
    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();
        let config = Config {
            hub_url: parse_url(self.hub_url, defaults.hub_url)?,
            ai_url: parse_url(self.ai_url, defaults.ai_url)?,
            guardian_url: parse_url(self.guardian_url, defaults.guardian_url)?,
            api_token: self.api_token.filter(|t| !t.trim().is_empty()),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            log_level: self.log_level.unwrap_or(defaults.log_level),
            log_json: self.log_json.unwrap_or(defaults.log_json),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_url(raw: Option<String>, default: Url) -> Result<Url> {
    match raw {
        Some(raw) => Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source }),
        None => Ok(default),
    }
}

fn parse_bounded<T>(name: &str, raw: &str, min: T, max: T) -> Result<T>
where
    T: FromStr + PartialOrd + fmt::Display,
{
    let value = raw.parse::<T>().map_err(|_| {
        Error::configuration(format!("{} must be an integer, got '{}'", name, raw))
    })?;
    if value < min || value > max {
        return Err(Error::configuration(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(value)
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err(Error::configuration(format!(
            "{} must be a boolean, got '{}'",
            name, raw
        ))),
    }
}

fn lookup_ci(map: &HashMap<String, String>, name: &str) -> Option<String> {
    map.get(name).cloned().or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    })
}

/// Process environment, exact name first, then case-insensitive
///
/// Entries whose name or value is not valid Unicode are skipped.
fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().or_else(|| {
        std::env::vars_os().find_map(|(k, v)| {
            let key = k.to_str()?;
            if key.eq_ignore_ascii_case(name) {
                v.into_string().ok()
            } else {
                None
            }
        })
    })
}

/// Read `KEY=value` entries without touching the process environment
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenv::from_path_iter(path).map_err(|e| Error::Configuration {
        message: format!("Failed to read env file {}", path.display()),
        source: Some(anyhow::Error::new(e)),
    })?;

    let mut entries = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| Error::Configuration {
            message: format!("Failed to parse env file {}", path.display()),
            source: Some(anyhow::Error::new(e)),
        })?;
        entries.insert(key, value);
    }
    Ok(entries)
}
