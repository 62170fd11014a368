//! Background expiry sweep.
//!
//! Periodically drops expired pairing records and closed rate-limit windows.
//! This only reclaims memory: expired codes are already refused by
//! [`PairingStore::consume_pairing`] whether or not a sweep has run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::pairing::store::PairingStore;
use crate::rate_limit::RateLimiter;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepResult {
    pub records_removed: usize,
    pub windows_pruned: usize,
    pub timestamp: DateTime<Utc>,
}

/// Periodic cleanup task for a [`PairingStore`] and its limiters.
pub struct PairingSweeper {
    store: PairingStore,
    limiters: Vec<RateLimiter>,
    interval: Duration,
}

impl PairingSweeper {
    pub fn new(store: PairingStore, interval: Duration) -> Self {
        Self {
            store,
            limiters: Vec::new(),
            interval,
        }
    }

    /// Builder: also prune this limiter's closed windows on every pass.
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiters.push(limiter);
        self
    }

    /// Run a single pass.
    pub async fn sweep_once(&self) -> SweepResult {
        let records_removed = self.store.sweep_expired().await;
        let mut windows_pruned = 0;
        for limiter in &self.limiters {
            windows_pruned += limiter.prune_expired().await;
        }
        SweepResult {
            records_removed,
            windows_pruned,
            timestamp: Utc::now(),
        }
    }

    /// Start the sweep loop on the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                interval_ms = self.interval.as_millis() as u64,
                limiters = self.limiters.len(),
                "Pairing sweeper started"
            );

            let mut timer = tokio::time::interval(self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;

                let result = self.sweep_once().await;
                if result.records_removed > 0 {
                    tracing::info!(
                        removed = result.records_removed,
                        "Swept expired pairing codes"
                    );
                }
                if result.windows_pruned > 0 {
                    tracing::debug!(
                        pruned = result.windows_pruned,
                        "Pruned closed rate-limit windows"
                    );
                }
            }
        })
    }
}
