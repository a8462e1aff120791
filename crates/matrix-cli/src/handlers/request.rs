//! Request command handler

use crate::cli::RequestArgs;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use matrix_core::http::{HeaderMap, HeaderName, HeaderValue};
use matrix_core::{MatrixClient, RequestOptions};
use tracing::{debug, instrument};

/// Handle the request command
#[instrument(skip(client, output, args), fields(method = %args.method, url = %args.url))]
pub async fn handle_request(
    args: RequestArgs,
    client: &MatrixClient,
    output: &mut OutputWriter,
) -> Result<()> {
    let options = RequestOptions {
        headers: parse_headers(&args.headers)?,
        body: args.data.as_deref().map(parse_body).transpose()?,
    };
    debug!(extra_headers = options.headers.len(), has_body = options.body.is_some(), "request_prepared");

    let spinner = output.spinner(&format!("{} {}", args.method, args.url));
    let result = client.request(args.method, &args.url, options).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    output.data(&result?)
}

/// Parse repeated `Name: value` arguments
fn parse_headers(raw: &[String]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for entry in raw {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| Error::invalid_args(format!("header '{}' is not 'Name: value'", entry)))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| Error::invalid_args(format!("invalid header name '{}': {}", name.trim(), e)))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| Error::invalid_args(format!("invalid value for header '{}': {}", name, e)))?;
        headers.append(name, value);
    }
    Ok(headers)
}

fn parse_body(raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).map_err(|e| Error::invalid_args(format!("--data is not valid JSON: {}", e)))
}
