//! Response classification
//!
//! Maps a [`RawOutcome`] onto a decoded JSON payload or a typed [`ApiError`].
//! Classification is a pure function of the outcome and whether a token is
//! configured, so classifying the same outcome twice gives equal results.

use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::http::error::{ApiError, ErrorKind};
use crate::http::request::{RawOutcome, RawResponse};

/// Result of classifying one attempt
pub type Classified = std::result::Result<Value, ApiError>;

/// Maps raw outcomes to the error taxonomy
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseClassifier {
    /// Appended to 401/403 messages; `None` when a token is configured
    auth_hint: Option<&'static str>,
}

impl ResponseClassifier {
    pub fn new(auth_hint: Option<&'static str>) -> Self {
        Self { auth_hint }
    }

    pub fn classify(&self, outcome: &RawOutcome) -> Classified {
        match outcome {
            RawOutcome::ConnectFailure { url, message } => Err(ApiError::new(
                ErrorKind::ConnectionFailure,
                format!("Failed to connect to {}: {}", url, message),
            )),
            RawOutcome::Timeout { url, message } => Err(ApiError::new(
                ErrorKind::Timeout,
                format!("Request to {} timed out: {}", url, message),
            )),
            RawOutcome::Rejected { url, message } => Err(ApiError::new(
                ErrorKind::GenericApiFailure,
                format!("Request to {} could not be completed: {}", url, message),
            )),
            RawOutcome::Response(response) if response.status < 400 => decode_success(response),
            RawOutcome::Response(response) => Err(self.classify_status(response)),
        }
    }

    fn classify_status(&self, response: &RawResponse) -> ApiError {
        let status = response.status;
        let error_data = serde_json::from_slice::<Value>(&response.body).ok();
        let message = extract_message(error_data.as_ref(), response);

        match status {
            401 | 403 => {
                let message = match self.auth_hint {
                    Some(hint) => format!("{}{}", message, hint),
                    None => message,
                };
                ApiError::new(ErrorKind::AuthenticationFailure, message).with_status(status)
            }
            404 => ApiError::new(ErrorKind::ResourceNotFound, message).with_status(status),
            422 => ApiError::new(ErrorKind::ValidationFailure, message)
                .with_status(status)
                .with_response_data(error_data),
            429 => ApiError::new(ErrorKind::RateLimited, message)
                .with_status(status)
                .with_retry_after(parse_retry_after(response)),
            _ => ApiError::new(ErrorKind::GenericApiFailure, message)
                .with_status(status)
                .with_response_data(error_data),
        }
    }
}

fn decode_success(response: &RawResponse) -> Classified {
    if response.body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(&response.body).map_err(|e| {
        ApiError::new(
            ErrorKind::DecodeFailure,
            format!("Failed to parse response from {} as JSON: {}", response.url, e),
        )
        .with_status(response.status)
    })
}

/// Prefer a `detail` field in a JSON error body, else the status line
fn extract_message(error_data: Option<&Value>, response: &RawResponse) -> String {
    match error_data.and_then(|data| data.get("detail")) {
        Some(Value::String(detail)) => detail.clone(),
        Some(detail) => detail.to_string(),
        None => status_line(response),
    }
}

fn status_line(response: &RawResponse) -> String {
    let reason = StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status");
    let class = match response.status {
        400..=499 => "Client error",
        500..=599 => "Server error",
        _ => "Unexpected status",
    };
    format!(
        "{} '{} {}' for url '{}'",
        class, response.status, reason, response.url
    )
}

/// `Retry-After` as integer seconds; HTTP-date or garbage counts as absent
fn parse_retry_after(response: &RawResponse) -> Option<Duration> {
    response
        .headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::auth::AUTH_HINT;
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::Url;
    use serde_json::json;

    fn response(status: u16, body: &str) -> RawOutcome {
        response_with_headers(status, body, HeaderMap::new())
    }

    fn response_with_headers(status: u16, body: &str, headers: HeaderMap) -> RawOutcome {
        RawOutcome::Response(RawResponse {
            status,
            headers,
            body: body.as_bytes().to_vec(),
            url: Url::parse("http://hub.local/apps").unwrap(),
        })
    }

    fn without_token() -> ResponseClassifier {
        ResponseClassifier::new(Some(AUTH_HINT))
    }

    fn with_token() -> ResponseClassifier {
        ResponseClassifier::new(None)
    }

    #[test]
    fn test_empty_success_body_is_empty_object() {
        let value = with_token().classify(&response(200, "")).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_success_body_is_decoded() {
        let value = with_token().classify(&response(200, r#"{"status":"ok"}"#)).unwrap();
        assert_eq!(value, json!({"status": "ok"}));
    }

    #[test]
    fn test_no_content_status_is_success() {
        let value = with_token().classify(&response(204, "")).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_unfollowed_redirect_status_is_success() {
        let value = with_token()
            .classify(&response(304, r#"{"cached":true}"#))
            .unwrap();
        assert_eq!(value, json!({"cached": true}));
    }

    #[test]
    fn test_malformed_success_body_is_decode_failure() {
        let err = with_token().classify(&response(200, "<html>")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DecodeFailure);
        assert_eq!(err.status_code, Some(200));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_auth_failure_hint_only_without_token() {
        for status in [401, 403] {
            let err = without_token()
                .classify(&response(status, r#"{"detail":"Not authenticated"}"#))
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::AuthenticationFailure);
            assert_eq!(err.status_code, Some(status));
            assert!(err.message.starts_with("Not authenticated"));
            assert!(err.message.contains("token missing"));

            let err = with_token()
                .classify(&response(status, r#"{"detail":"Not authenticated"}"#))
                .unwrap_err();
            assert_eq!(err.message, "Not authenticated");
        }
    }

    #[test]
    fn test_not_found() {
        let err = with_token().classify(&response(404, "")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ResourceNotFound);
        assert_eq!(
            err.message,
            "Client error '404 Not Found' for url 'http://hub.local/apps'"
        );
    }

    #[test]
    fn test_validation_failure_preserves_body() {
        let err = with_token()
            .classify(&response(422, r#"{"detail": "bad field"}"#))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationFailure);
        assert_eq!(err.message, "bad field");
        assert_eq!(err.response_data, Some(json!({"detail": "bad field"})));
    }

    #[test]
    fn test_structured_detail_is_rendered_as_json() {
        let body = r#"{"detail":[{"loc":["body","name"],"msg":"field required"}]}"#;
        let err = with_token().classify(&response(422, body)).unwrap_err();
        assert!(err.message.contains("field required"));
        assert!(err.message.starts_with('['));
    }

    #[test]
    fn test_rate_limit_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        let err = with_token()
            .classify(&response_with_headers(429, "", headers))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert_eq!(err.retry_after, Some(Duration::from_secs(7)));

        let err = with_token().classify(&response(429, "")).unwrap_err();
        assert_eq!(err.retry_after, None);
    }

    #[test]
    fn test_non_numeric_retry_after_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        let err = with_token()
            .classify(&response_with_headers(429, "", headers))
            .unwrap_err();
        assert_eq!(err.retry_after, None);
    }

    #[test]
    fn test_generic_failure_falls_back_to_status_line() {
        let err = with_token()
            .classify(&response(503, "upstream unavailable"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::GenericApiFailure);
        assert_eq!(err.status_code, Some(503));
        assert_eq!(
            err.message,
            "Server error '503 Service Unavailable' for url 'http://hub.local/apps'"
        );
        assert_eq!(err.response_data, None);
    }

    #[test]
    fn test_generic_failure_keeps_json_body() {
        let err = with_token()
            .classify(&response(500, r#"{"detail":"db down","code":17}"#))
            .unwrap_err();
        assert_eq!(err.message, "db down");
        assert_eq!(err.response_data, Some(json!({"detail": "db down", "code": 17})));
    }

    #[test]
    fn test_transport_failures() {
        let url = Url::parse("http://guardian.local/health").unwrap();
        let err = with_token()
            .classify(&RawOutcome::ConnectFailure {
                url: url.clone(),
                message: "connection refused".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConnectionFailure);
        assert!(err.status_code.is_none());

        let err = with_token()
            .classify(&RawOutcome::Timeout {
                url,
                message: "deadline elapsed".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[test]
    fn test_rejected_exchange_is_terminal() {
        let err = with_token()
            .classify(&RawOutcome::Rejected {
                url: Url::parse("http://hub.local/loop").unwrap(),
                message: "too many redirects".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::GenericApiFailure);
        assert!(!err.is_retryable());
        assert!(err.message.contains("too many redirects"));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let outcomes = [
            response(200, r#"{"a":1}"#),
            response(401, ""),
            response(422, r#"{"detail":"x"}"#),
            response(500, "oops"),
        ];
        let classifier = without_token();
        for outcome in &outcomes {
            assert_eq!(classifier.classify(outcome), classifier.classify(outcome));
        }
    }
}
