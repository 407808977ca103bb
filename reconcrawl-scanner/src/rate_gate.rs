use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between dispatches.
///
/// The lock is held across the sleep, so concurrent callers queue up and
/// are released one interval apart instead of computing overlapping waits.
pub struct RateGate {
    interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Rates too small to represent saturate at `Duration::MAX`.
    pub fn per_second(requests_per_second: f64) -> Self {
        Self::new(
            Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or(Duration::MAX),
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn wait(&self) {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_wait_is_immediate() {
        let gate = RateGate::new(Duration::from_secs(1));
        let start = Instant::now();
        gate.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_tiny_rate_saturates() {
        assert_eq!(RateGate::per_second(1e-300).interval(), Duration::MAX);
        assert_eq!(RateGate::per_second(4.0).interval(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_waits_are_spaced() {
        let gate = RateGate::per_second(10.0);
        let start = Instant::now();
        for _ in 0..5 {
            gate.wait().await;
        }
        // First dispatch is free, the next four wait 100ms each
        assert!(start.elapsed() >= Duration::from_millis(400));
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_do_not_burst() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(50)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                gate.wait().await;
                Instant::now()
            }));
        }

        let mut granted = Vec::new();
        for handle in handles {
            granted.push(handle.await.unwrap());
        }
        granted.sort();

        for pair in granted.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(50));
        }
        assert!(start.elapsed() >= Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_idle_period() {
        let gate = RateGate::new(Duration::from_millis(100));
        gate.wait().await;
        tokio::time::sleep(Duration::from_millis(250)).await;

        let start = Instant::now();
        gate.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
