use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::StravaError;

/// Strava allows 100 requests every 15 minutes.
/// See <https://developers.strava.com/docs/rate-limits/>.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(9);

/// Gate every outgoing request.
///
/// `acquire` may suspend. Callers bound the wait with a
/// [`CallContext`](crate::CallContext) or by dropping the future; a dropped
/// wait must not consume a slot.
#[async_trait]
pub trait RateLimiter: Send + Sync + std::fmt::Debug {
    async fn acquire(&self) -> Result<(), StravaError>;
}

/// Token bucket with capacity one: the first acquisition is immediate, every
/// following one completes at least `interval` after the previous.
#[derive(Debug)]
pub struct IntervalRateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl IntervalRateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for IntervalRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

#[async_trait]
impl RateLimiter for IntervalRateLimiter {
    async fn acquire(&self) -> Result<(), StravaError> {
        // The lock is held across the sleep so waiters queue in order, and the
        // slot is only recorded once the wait has finished.
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.interval;
            if ready_at > Instant::now() {
                tracing::trace!(wait_ms = (ready_at - Instant::now()).as_millis() as u64, "rate limited");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
        Ok(())
    }
}

/// No throttling at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn acquire(&self) -> Result<(), StravaError> {
        Ok(())
    }
}

/// The limiter shared by every client built without an explicit one.
pub fn shared() -> Arc<dyn RateLimiter> {
    static SHARED: OnceLock<Arc<dyn RateLimiter>> = OnceLock::new();
    SHARED
        .get_or_init(|| Arc::new(IntervalRateLimiter::default()))
        .clone()
}
