//! Single-attempt request execution
//!
//! A [`Request`] is built once per logical call and re-sent verbatim on every
//! retry. [`execute_once`] performs one network attempt and reports what
//! happened as a [`RawOutcome`]; it never interprets status codes.

use reqwest::header::HeaderMap;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// HTTP methods the service APIs use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(format!(
                "Unsupported HTTP method: {}. Must be one of GET, POST, PUT, DELETE",
                s
            )),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One outgoing request, fully resolved
#[derive(Debug, Clone)]
pub struct Request {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: HttpMethod, url: Url, headers: HeaderMap, body: Option<Value>) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }
}

/// A response as received, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Final URL after redirects
    pub url: Url,
}

/// What a single attempt produced
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutcome {
    /// Could not reach the server (DNS, refused, reset, protocol fault)
    ConnectFailure { url: Url, message: String },
    /// No complete response within the deadline
    Timeout { url: Url, message: String },
    /// Exchange that cannot complete, such as a redirect loop or an
    /// unbuildable request
    Rejected { url: Url, message: String },
    /// Any HTTP response, whatever its status
    Response(RawResponse),
}

impl RawOutcome {
    fn from_transport_error(url: &Url, error: reqwest::Error) -> Self {
        let url = error.url().cloned().unwrap_or_else(|| url.clone());
        let message = error.to_string();
        if error.is_timeout() {
            RawOutcome::Timeout { url, message }
        } else if error.is_redirect() || error.is_builder() {
            RawOutcome::Rejected { url, message }
        } else {
            RawOutcome::ConnectFailure { url, message }
        }
    }
}

/// Perform exactly one network attempt
///
/// The per-attempt deadline comes from the transport's configured timeout and
/// covers reading the body as well as receiving the headers.
pub async fn execute_once(client: &reqwest::Client, request: &Request) -> RawOutcome {
    let mut builder = client
        .request(request.method.into(), request.url.clone())
        .headers(request.headers.clone());
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => return RawOutcome::from_transport_error(&request.url, e),
    };

    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let url = response.url().clone();

    match response.bytes().await {
        Ok(body) => RawOutcome::Response(RawResponse {
            status,
            headers,
            body: body.to_vec(),
            url,
        }),
        Err(e) => RawOutcome::from_transport_error(&request.url, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_method_converts_to_reqwest() {
        assert_eq!(reqwest::Method::from(HttpMethod::Put), reqwest::Method::PUT);
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_failure() {
        // Bind then drop to get a port nobody is listening on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/health", addr)).unwrap();
        let request = Request::new(HttpMethod::Get, url, HeaderMap::new(), None);
        let client = reqwest::Client::new();

        match execute_once(&client, &request).await {
            RawOutcome::ConnectFailure { url, .. } => assert_eq!(url.path(), "/health"),
            other => panic!("expected connect failure, got {:?}", other),
        }
    }
}
