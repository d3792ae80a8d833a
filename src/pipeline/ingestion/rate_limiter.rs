use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces a minimum interval between successive requests. Shared by all
/// callers of one fetcher, so concurrent fetches are serialized by it.
#[derive(Debug)]
pub struct PolitenessLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl PolitenessLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until `min_interval` has passed since the previous acquire.
    pub async fn acquire(&self) {
        // The lock is held across the sleep so waiters queue in order
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
