use crate::error::{Result, ScanError};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Caps the number of in-flight requests.
///
/// `acquire` hands back a permit guard; the slot is returned when the guard
/// is dropped, including when the owning future is cancelled.
pub struct ConcurrencyLimiter {
    semaphore: Semaphore,
    capacity: usize,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
        }
    }

    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.semaphore
            .acquire()
            .await
            .map_err(|e| ScanError::InvalidConfig(format!("Concurrency limiter closed: {}", e)))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
