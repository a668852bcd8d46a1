// Request pacing for the hosted inference backend.
//
// The serverless Inference API throttles free accounts. All hosted adapters
// share one limiter so the three models together stay under the configured
// requests-per-second ceiling. Each call waits until at least `interval` has
// passed since the previous one was let through.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Shared limiter; clones pace against the same clock.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

struct RateLimiterInner {
    /// Minimum time between requests
    interval: Duration,
    /// When the last request was allowed through
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_second` calls per second.
    /// Non-positive or non-finite rates are clamped to one call per second.
    pub fn new(requests_per_second: f64) -> Self {
        let rate = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            requests_per_second
        } else {
            1.0
        };
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                interval: Duration::from_secs_f64(1.0 / rate),
                last_request: None,
            })),
        }
    }

    /// Wait until a request is allowed, then return.
    pub async fn acquire(&self) {
        let mut inner = self.inner.lock().await;

        if let Some(last) = inner.last_request {
            let elapsed = Instant::now().duration_since(last);
            if elapsed < inner.interval {
                // Hold the lock while sleeping: the next caller must queue
                // behind this slot, not race for the same one.
                tokio::time::sleep(inner.interval - elapsed).await;
            }
        }

        inner.last_request = Some(Instant::now());
    }
}
