//! Rate limiting middleware for the API
//!
//! Each client IP gets `max_requests` per `window`, refilled continuously.
//! Exempt paths (matched against the router-relative path) and exempt IPs
//! bypass the limiter. A bucket idle for a whole window is full again, so it
//! is dropped and recreated on the client's next request.

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::config::RateLimitConfig;

/// Token bucket holding at most `capacity` requests
struct TokenBucket {
    /// Available tokens
    tokens: f64,
    /// Last refill time
    last_refill: Instant,
    /// Tokens per second
    rate: f64,
    /// Maximum burst size
    capacity: u32,
}

impl TokenBucket {
    fn new(rate: f64, capacity: u32) -> Self {
        Self {
            tokens: capacity as f64,
            last_refill: Instant::now(),
            rate,
            capacity,
        }
    }

    /// Take one token, or return the seconds until one is available
    fn try_consume(&mut self) -> Option<u64> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity as f64);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            let wait_secs = ((1.0 - self.tokens) / self.rate).ceil() as u64;
            Some(wait_secs.max(1))
        }
    }
}

/// Per-IP buckets plus the time they were last swept
struct Buckets {
    by_ip: HashMap<IpAddr, TokenBucket>,
    last_prune: Instant,
}

impl Buckets {
    /// Drop buckets untouched for at least `window`
    fn prune(&mut self, window: Duration) {
        let before = self.by_ip.len();
        self.by_ip
            .retain(|_, bucket| bucket.last_refill.elapsed() < window);
        self.last_prune = Instant::now();

        let evicted = before - self.by_ip.len();
        if evicted > 0 {
            tracing::trace!(evicted, remaining = self.by_ip.len(), "Pruned idle rate limit buckets");
        }
    }
}

/// Rate limiter with per-IP tracking
pub struct RateLimiter {
    /// Per-IP token buckets
    buckets: Mutex<Buckets>,
    /// Configuration
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter from configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(Buckets {
                by_ip: HashMap::new(),
                last_prune: Instant::now(),
            }),
            config,
        }
    }

    /// Refill rate spreading `max_requests` over the window
    fn refill_rate(&self) -> f64 {
        let window = self.config.window.as_secs_f64().max(0.001);
        f64::from(self.config.max_requests) / window
    }

    /// Exact or prefix match against the exempt paths
    fn is_path_exempt(&self, path: &str) -> bool {
        self.config
            .exempt_paths
            .iter()
            .any(|exempt| path == exempt || path.starts_with(exempt.as_str()))
    }

    fn is_ip_exempt(&self, addr: &SocketAddr) -> bool {
        self.config.exempt_ips.contains(&addr.ip())
    }

    /// Check if request should be rate limited
    ///
    /// Returns `Some(retry_after_seconds)` when the caller is over its limit.
    pub async fn check(&self, path: &str, addr: SocketAddr) -> Option<u64> {
        if self.is_path_exempt(path) || self.is_ip_exempt(&addr) {
            return None;
        }

        let rate = self.refill_rate();
        let mut buckets = self.buckets.lock().await;
        if buckets.last_prune.elapsed() >= self.config.window {
            buckets.prune(self.config.window);
        }
        let bucket = buckets
            .by_ip
            .entry(addr.ip())
            .or_insert_with(|| TokenBucket::new(rate, self.config.max_requests));
        bucket.try_consume()
    }

    /// Number of clients currently holding a bucket
    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.buckets.lock().await.by_ip.len()
    }
}

/// Rate limiting middleware function
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    match limiter.check(req.uri().path(), addr).await {
        None => next.run(req).await,
        Some(retry_after) => {
            tracing::debug!(ip = %addr.ip(), retry_after, "Rate limit exceeded");
            let error = json!({
                "error": {
                    "code": "rate_limited",
                    "message": "Too many requests, please try again later",
                    "details": {
                        "retry_after_seconds": retry_after
                    }
                }
            });
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(error)).into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}
