//! Shared helpers for client integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use matrix_core::{Config, MatrixClient};
use tokio::net::TcpListener;

/// Client whose three services all point at `base_url`
pub fn client_for(base_url: &str, token: Option<&str>, max_retries: u32) -> MatrixClient {
    client_with_timeout(base_url, token, max_retries, Duration::from_secs(5))
}

pub fn client_with_timeout(
    base_url: &str,
    token: Option<&str>,
    max_retries: u32,
    timeout: Duration,
) -> MatrixClient {
    let mut builder = Config::builder()
        .all_urls(base_url)
        .timeout(timeout)
        .max_retries(max_retries);
    if let Some(token) = token {
        builder = builder.api_token(token);
    }
    MatrixClient::new(builder.build().unwrap()).unwrap()
}

/// An address nothing is listening on
pub fn refused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Accepts connections, never answers, and counts the accepts
pub struct SilentServer {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
}

impl SilentServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        });

        Self { addr, accepted }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}
