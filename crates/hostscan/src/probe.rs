//! Reachability probes.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

/// Windows file sharing; a host that answers here can take a deployment.
pub const DEFAULT_PROBE_PORT: u16 = 445;

/// Answers whether a host is reachable, and how fast.
///
/// `Err` carries a human-readable reason that ends up in the host's status
/// message.
pub trait Prober: Send + Sync {
    fn probe(
        &self,
        host: &str,
        limit: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Duration, String>> + Send + '_>>;
}

/// Probes by opening a TCP connection to the file-sharing port.
#[derive(Debug, Clone)]
pub struct TcpProber {
    pub port: u16,
}

impl TcpProber {
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PROBE_PORT,
        }
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober for TcpProber {
    fn probe(
        &self,
        host: &str,
        limit: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Duration, String>> + Send + '_>> {
        let addr = format!("{host}:{}", self.port);
        Box::pin(async move {
            let started = Instant::now();
            match tokio::time::timeout(limit, TcpStream::connect(&addr)).await {
                Ok(Ok(_stream)) => {
                    let latency = started.elapsed();
                    debug!(addr, latency_ms = latency.as_millis() as u64, "probe ok");
                    Ok(latency)
                }
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("timed out after {}ms", limit.as_millis())),
            }
        })
    }
}
