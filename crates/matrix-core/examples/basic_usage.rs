// Probe every Matrix service and branch on the failure kind
// Usage: cargo run --example basic_usage
// Reads MATRIX_HUB_URL, MATRIX_AI_URL, MATRIX_GUARDIAN_URL and MATRIX_HUB_TOKEN
// from the environment or ./.env

use matrix_core::{Config, ErrorKind, MatrixClient, Service};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    println!("Using {:?}", config);

    let mut client = MatrixClient::new(config)?;

    for service in Service::ALL {
        match client.health_check(service).await {
            Ok(body) => println!("{:<9} ok   {}", service, body),
            Err(err) => match err.as_api() {
                Some(api) if api.kind == ErrorKind::RateLimited => println!(
                    "{:<9} rate limited, retry after {:?}",
                    service, api.retry_after
                ),
                Some(api) if api.is_retryable() => println!(
                    "{:<9} unreachable after {} attempts: {}",
                    service,
                    api.attempts.unwrap_or(1),
                    api.message
                ),
                _ => println!("{:<9} failed: {}", service, err),
            },
        }
    }

    client.close();
    Ok(())
}
