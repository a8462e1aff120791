//! Info command handler

use crate::error::Result;
use crate::output::OutputWriter;
use matrix_core::{Config, LogLevel, VERSION};
use serde::Serialize;

/// Effective settings; the token itself is never included
#[derive(Debug, Serialize)]
pub struct InfoReport {
    pub version: &'static str,
    pub hub_url: String,
    pub ai_url: String,
    pub guardian_url: String,
    pub timeout_secs: f64,
    pub max_retries: u32,
    pub log_level: LogLevel,
    pub log_json: bool,
    pub token_configured: bool,
}

impl From<&Config> for InfoReport {
    fn from(config: &Config) -> Self {
        Self {
            version: VERSION,
            hub_url: config.hub_url.to_string(),
            ai_url: config.ai_url.to_string(),
            guardian_url: config.guardian_url.to_string(),
            timeout_secs: config.timeout.as_secs_f64(),
            max_retries: config.max_retries,
            log_level: config.log_level,
            log_json: config.log_json,
            token_configured: config.has_token(),
        }
    }
}

/// Handle the info command
pub fn handle_info(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let report = InfoReport::from(config);

    if !output.is_human() {
        return output.data(&report);
    }

    output.section("Matrix System")?;
    output.key_value("Version", report.version)?;
    output.key_value("Hub URL", &report.hub_url)?;
    output.key_value("AI URL", &report.ai_url)?;
    output.key_value("Guardian URL", &report.guardian_url)?;
    output.key_value("Timeout", &format!("{}s", report.timeout_secs))?;
    output.key_value("Max retries", &report.max_retries.to_string())?;
    output.key_value("Log level", report.log_level.as_str())?;
    output.key_value("JSON logs", &report.log_json.to_string())?;
    output.key_value(
        "Token",
        if report.token_configured { "configured" } else { "not set" },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_never_contains_token() {
        let config = Config::builder()
            .api_token("super-secret-token")
            .build()
            .unwrap();
        let report = InfoReport::from(&config);
        assert!(report.token_configured);

        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("super-secret-token"));
        assert!(json.contains("\"log_level\":\"INFO\""));
    }

    #[test]
    fn test_report_defaults() {
        let report = InfoReport::from(&Config::default());
        assert_eq!(report.version, VERSION);
        assert_eq!(report.timeout_secs, 30.0);
        assert_eq!(report.max_retries, 3);
        assert!(!report.token_configured);
    }
}
