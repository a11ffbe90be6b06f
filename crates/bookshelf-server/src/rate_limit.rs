//! Token bucket admission gate
//!
//! The bucket starts full. Each check first credits one token per whole
//! refill interval elapsed (capped at capacity), then spends one token if
//! any is left. There is no waiting: an empty bucket rejects immediately.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

pub struct RateLimiter {
    capacity: u32,
    rate: Duration,
    bucket: Mutex<Bucket>,
}

struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl RateLimiter {
    /// `capacity` tokens at most, one more every `rate`.
    ///
    /// A zero `rate` is treated as one nanosecond.
    pub fn new(capacity: u32, rate: Duration) -> Self {
        Self::starting_at(capacity, rate, Instant::now())
    }

    fn starting_at(capacity: u32, rate: Duration, now: Instant) -> Self {
        Self {
            capacity,
            rate: rate.max(Duration::from_nanos(1)),
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: now,
            }),
        }
    }

    /// Admit or reject one request
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&self, now: Instant) -> bool {
        // The whole check-and-decrement runs under one lock
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let intervals = elapsed.as_nanos() / self.rate.as_nanos();
        if intervals > 0 {
            let refill = u32::try_from(intervals).unwrap_or(u32::MAX);
            bucket.tokens = bucket.tokens.saturating_add(refill).min(self.capacity);
            bucket.last_refill = now;
        }

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            false
        }
    }
}

/// Middleware rejecting requests with 429 once the bucket is empty
pub async fn limit_requests(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.allow() {
        warn!(
            "Rate limit exceeded: {} {}",
            request.method(),
            request.uri().path()
        );
        return (StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response();
    }

    next.run(request).await
}
