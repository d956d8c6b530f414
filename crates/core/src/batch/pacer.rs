//! Dispatch pacing for batch runs.
//!
//! The meeting API limits how many meetings may be created per day and
//! throttles bursts, so a batch waits on a `Pacer` before every call.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

use crate::config::{BatchConfig, PacingMethod};

/// Gate awaited before each dispatched call.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until the next call may go out.
    async fn ready(&self);
}

/// Create the pacer selected by configuration.
pub fn create_pacer(config: &BatchConfig) -> Box<dyn Pacer> {
    match config.pacing {
        PacingMethod::None => Box::new(NoPacer),
        PacingMethod::FixedInterval => Box::new(FixedIntervalPacer::new(Duration::from_millis(
            config.interval_ms,
        ))),
        PacingMethod::TokenBucket => Box::new(TokenBucketPacer::new(config.requests_per_minute)),
    }
}

/// Dispatches immediately.
pub struct NoPacer;

#[async_trait]
impl Pacer for NoPacer {
    async fn ready(&self) {}
}

/// Keeps at least `interval` between consecutive calls. The first call
/// goes out immediately.
pub struct FixedIntervalPacer {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl FixedIntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Pacer for FixedIntervalPacer {
    async fn ready(&self) {
        let mut last = self.last_call.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.interval {
                let wait_time = self.interval - elapsed;
                debug!("Pacing: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Token bucket allowing bursts up to its capacity.
///
/// Tokens are added at a constant rate and consumed per call.
pub struct TokenBucket {
    /// Max tokens (= requests per minute).
    capacity: f32,
    tokens: f32,
    /// Tokens added per second.
    refill_rate: f32,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket for the given rate.
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Take a token, or return how long until one is available.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let tokens_needed = 1.0 - self.tokens;
            let wait_secs = tokens_needed / self.refill_rate;
            Err(Duration::from_secs_f32(wait_secs))
        }
    }

    pub fn tokens_available(&mut self) -> f32 {
        self.refill();
        self.tokens
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Waits on a shared token bucket.
pub struct TokenBucketPacer {
    bucket: Mutex<TokenBucket>,
}

impl TokenBucketPacer {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(requests_per_minute)),
        }
    }
}

#[async_trait]
impl Pacer for TokenBucketPacer {
    async fn ready(&self) {
        loop {
            let result = self.bucket.lock().await.try_acquire();
            match result {
                Ok(()) => return,
                Err(wait) => {
                    debug!("Pacing: bucket empty, waiting {:?}", wait);
                    sleep(wait).await;
                }
            }
        }
    }
}
