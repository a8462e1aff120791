//! Health command handler

use crate::cli::HealthArgs;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use matrix_core::{ErrorKind, MatrixClient, Service};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Outcome of probing one service
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub service: Service,
    pub url: String,
    pub healthy: bool,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProbeFailure>,
}

#[derive(Debug, Serialize)]
pub struct ProbeFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub message: String,
}

impl From<&matrix_core::Error> for ProbeFailure {
    fn from(error: &matrix_core::Error) -> Self {
        match error.as_api() {
            Some(api) => Self {
                kind: Some(api.kind),
                status_code: api.status_code,
                message: api.message.clone(),
            },
            None => Self {
                kind: None,
                status_code: None,
                message: error.to_string(),
            },
        }
    }
}

/// Handle the health command
///
/// Every selected service is probed even when an earlier probe fails.
#[instrument(skip(client, output), fields(service = ?args.service))]
pub async fn handle_health(
    args: HealthArgs,
    client: &MatrixClient,
    output: &mut OutputWriter,
) -> Result<()> {
    let services = args.service.services();
    let mut reports = Vec::with_capacity(services.len());

    for service in services {
        let spinner = output.spinner(&format!("Probing {}...", service));
        let report = probe(client, service).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        reports.push(report);
    }

    render(&reports, output)?;

    let failed = reports.iter().filter(|r| !r.healthy).count();
    if failed > 0 {
        return Err(Error::HealthCheckFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

async fn probe(client: &MatrixClient, service: Service) -> ProbeReport {
    let url = client
        .service_url(service, "health")
        .map(|u| u.to_string())
        .unwrap_or_else(|_| client.config().base_url(service).to_string());

    let timer = Timer::new("health_probe");
    let result = client.health_check(service).await;
    let response_time_ms = timer.elapsed().as_millis() as u64;

    match result {
        Ok(details) => {
            info!(service = %service, response_time_ms, "health_ok");
            ProbeReport {
                service,
                url,
                healthy: true,
                response_time_ms,
                details: Some(details),
                error: None,
            }
        }
        Err(e) => {
            warn!(service = %service, error = %e, "health_failed");
            ProbeReport {
                service,
                url,
                healthy: false,
                response_time_ms,
                details: None,
                error: Some(ProbeFailure::from(&e)),
            }
        }
    }
}

fn render(reports: &[ProbeReport], output: &mut OutputWriter) -> Result<()> {
    if !output.is_human() {
        return output.data(&reports);
    }

    output.section("Service Health")?;
    for report in reports {
        if report.healthy {
            output.success(&format!(
                "{:<9} {} ({} ms)",
                report.service, report.url, report.response_time_ms
            ))?;
        } else {
            let reason = report
                .error
                .as_ref()
                .map(|e| match e.kind {
                    Some(kind) => format!("{}: {}", kind, e.message),
                    None => e.message.clone(),
                })
                .unwrap_or_default();
            output.error(&format!(
                "{:<9} {} ({} ms) {}",
                report.service, report.url, report.response_time_ms, reason
            ))?;
        }
    }
    Ok(())
}
