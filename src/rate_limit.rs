//! Fixed-window request limiter keyed by client.
//!
//! Each limiter instance owns its own map, so the create and retrieve
//! endpoints never share counts. State is process-local: several replicas
//! behind a load balancer each count independently, which makes this a
//! best-effort flood guard rather than a security boundary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::config::{MAX_DURATION_MS, RateLimitConfig};

/// Bucket shared by every client that could not be identified.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Counter for one client within the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    /// Requests accepted since the window opened.
    pub count: u32,
    /// When the window closes and the count starts over.
    pub reset_at: Instant,
}

/// Per-client fixed-window limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    name: Arc<str>,
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<String, RateLimitWindow>>>,
}

impl RateLimiter {
    /// Create a limiter; `name` only appears in logs.
    ///
    /// The window is capped at [`MAX_DURATION_MS`].
    pub fn new(name: &str, mut config: RateLimitConfig) -> Self {
        config.window = config.window.min(Duration::from_millis(MAX_DURATION_MS));
        Self {
            name: Arc::from(name),
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Count a request from `client_key`; `false` means reject it.
    pub async fn check(&self, client_key: &str) -> bool {
        self.check_at(client_key, Instant::now()).await
    }

    /// [`check`](Self::check) with an explicit clock reading.
    pub async fn check_at(&self, client_key: &str, now: Instant) -> bool {
        let mut windows = self.windows.write().await;

        match windows.get_mut(client_key) {
            Some(window) if now < window.reset_at => {
                if window.count >= self.config.max_requests {
                    return false;
                }
                window.count += 1;
                true
            }
            _ => {
                windows.insert(
                    client_key.to_string(),
                    RateLimitWindow {
                        count: 1,
                        reset_at: now + self.config.window,
                    },
                );
                true
            }
        }
    }

    /// Time left until `client_key` may send again, if it is currently blocked.
    pub async fn retry_after(&self, client_key: &str) -> Option<Duration> {
        self.retry_after_at(client_key, Instant::now()).await
    }

    /// [`retry_after`](Self::retry_after) with an explicit clock reading.
    pub async fn retry_after_at(&self, client_key: &str, now: Instant) -> Option<Duration> {
        let windows = self.windows.read().await;
        windows
            .get(client_key)
            .filter(|w| w.count >= self.config.max_requests && now < w.reset_at)
            .map(|w| w.reset_at - now)
    }

    /// Current window for `client_key`, if one is open.
    pub async fn window(&self, client_key: &str) -> Option<RateLimitWindow> {
        self.windows.read().await.get(client_key).copied()
    }

    /// Drop windows that have closed. Returns the number removed.
    pub async fn prune_expired(&self) -> usize {
        self.prune_expired_at(Instant::now()).await
    }

    /// [`prune_expired`](Self::prune_expired) with an explicit clock reading.
    pub async fn prune_expired_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, w| now < w.reset_at);
        before - windows.len()
    }

    /// Number of clients with an open window.
    pub async fn tracked_clients(&self) -> usize {
        self.windows.read().await.len()
    }
}
