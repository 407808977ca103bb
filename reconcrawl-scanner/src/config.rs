use crate::error::{Result, ScanError};
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 20;
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;
pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Upper bound for the connect and read phases of a single request.
pub const PHASE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables shared by every crawler of a run.
///
/// Limits apply per host: each host gets its own rate gate and limiter
/// built from these values.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub max_concurrent_requests: usize,
    pub requests_per_second: f64,
    pub max_depth: usize,
    pub timeout: Duration,
    pub user_agent: String,
}

impl CrawlConfig {
    pub fn new() -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("reconcrawl/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Minimum spacing between two dispatches of the same host's crawler.
    ///
    /// Saturates at `Duration::MAX` for rates too small to represent;
    /// `validate` rejects those.
    pub fn rate_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.requests_per_second).unwrap_or(Duration::MAX)
    }

    pub fn connect_timeout(&self) -> Duration {
        self.timeout.min(PHASE_TIMEOUT)
    }

    pub fn read_timeout(&self) -> Duration {
        self.timeout.min(PHASE_TIMEOUT)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ScanError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ScanError::InvalidConfig(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if !self.requests_per_second.is_finite() || self.requests_per_second <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "requests_per_second must be a positive number, got {}",
                self.requests_per_second
            )));
        }
        if Duration::try_from_secs_f64(1.0 / self.requests_per_second).is_err() {
            return Err(ScanError::InvalidConfig(format!(
                "requests_per_second is too small, got {}",
                self.requests_per_second
            )));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new()
    }
}
