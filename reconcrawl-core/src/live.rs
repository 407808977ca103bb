// Liveness probing for enumerated subdomains

use futures::future::join_all;
use reconcrawl_scanner::{ConcurrencyLimiter, RateGate};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_LIVE_CONCURRENCY: usize = 30;
pub const DEFAULT_LIVE_REQUESTS_PER_SECOND: f64 = 20.0;

/// Result of probing a single host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live(u16),
    ServerError(u16),
    NoResponse,
}

impl Liveness {
    pub fn is_live(&self) -> bool {
        matches!(self, Liveness::Live(_))
    }

    fn from_status(status: u16) -> Self {
        if status < 500 {
            Liveness::Live(status)
        } else {
            Liveness::ServerError(status)
        }
    }
}

pub struct LiveChecker {
    client: Client,
    gate: RateGate,
    limiter: ConcurrencyLimiter,
}

impl LiveChecker {
    pub fn new(
        max_concurrent: usize,
        requests_per_second: f64,
        timeout: Duration,
    ) -> Result<Self, String> {
        if max_concurrent == 0 {
            return Err("Live check concurrency must be at least 1".to_string());
        }
        if !requests_per_second.is_finite()
            || requests_per_second <= 0.0
            || Duration::try_from_secs_f64(1.0 / requests_per_second).is_err()
        {
            return Err(format!(
                "Live check rate must be positive, got {}",
                requests_per_second
            ));
        }

        let client = Client::builder()
            .user_agent(format!("reconcrawl/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            gate: RateGate::per_second(requests_per_second),
            limiter: ConcurrencyLimiter::new(max_concurrent),
        })
    }

    /// Returns the hosts that answered, in input order.
    pub async fn check_alive(&self, hosts: &[String]) -> Vec<String> {
        let probes = hosts.iter().map(|host| async move {
            let liveness = self.probe(host).await;
            debug!("{} -> {:?}", host, liveness);
            (host, liveness)
        });

        join_all(probes)
            .await
            .into_iter()
            .filter(|(_, liveness)| liveness.is_live())
            .map(|(host, _)| host.clone())
            .collect()
    }

    /// HTTPS first; plain HTTP only when HTTPS produced no response at all.
    pub async fn probe(&self, host: &str) -> Liveness {
        self.gate.wait().await;
        let Ok(_permit) = self.limiter.acquire().await else {
            return Liveness::NoResponse;
        };

        match self.client.get(format!("https://{}", host)).send().await {
            Ok(response) => Liveness::from_status(response.status().as_u16()),
            Err(e) => {
                debug!("https://{} failed: {}", host, e);
                match self.client.get(format!("http://{}", host)).send().await {
                    Ok(response) => Liveness::from_status(response.status().as_u16()),
                    Err(e) => {
                        debug!("http://{} failed: {}", host, e);
                        Liveness::NoResponse
                    }
                }
            }
        }
    }
}
