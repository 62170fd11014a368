//! One-time pairing code store.
//!
//! A vault mints a short code bound to its public keys; a second device
//! redeems the code exactly once within the TTL. Consumed records stay
//! behind as payload-free tombstones until their original expiry so a
//! repeat fetch can be told "already used" instead of "not found".
//!
//! ```text
//! create_pairing ──► Live ──consume_pairing──► Tombstone ──expiry──► (gone)
//!                     │                                      ▲
//!                     └───────────────expiry─────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::PairingConfig;
use crate::error::PairingError;
use crate::pairing::code::{generate_code, redact};

/// One derived public key handed to the paired device.
///
/// Only the three named fields are interpreted; anything else the vault
/// sends is kept verbatim and returned to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubkeyDescriptor {
    /// Encoded key material (xpub, hex pubkey, ...).
    pub pubkey: String,
    /// Derivation path of the account root.
    pub path_master: String,
    /// Network identifiers the key applies to.
    pub networks: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Payload stored under a pairing code.
#[derive(Debug, Clone, PartialEq)]
pub struct PairingData {
    pub device_id: String,
    pub label: String,
    pub pubkeys: Vec<PubkeyDescriptor>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Origin of the vault instance that created the pairing.
    pub vault_url: String,
}

/// What the creator gets back from [`PairingStore::create_pairing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingTicket {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    /// Lifetime of the code in whole seconds.
    pub expires_in_secs: u64,
}

/// Result of redeeming a code.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    /// First redemption; the payload is no longer held by the store.
    Consumed(PairingData),
    /// Unknown or expired code. The two are intentionally indistinguishable.
    NotFound,
    /// The code was redeemed before and has not expired yet. Expired
    /// tombstones read as [`NotFound`](Self::NotFound), swept or not.
    AlreadyUsed,
}

/// Point-in-time record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairingStats {
    pub total: usize,
    /// Unused and unexpired.
    pub active: usize,
    /// Redeemed tombstones that have not expired yet.
    pub consumed: usize,
    /// Past expiry, waiting for the sweep.
    pub expired: usize,
}

#[derive(Debug)]
struct PairingRecord {
    expires_at: DateTime<Utc>,
    used: bool,
    /// `None` once consumed.
    data: Option<PairingData>,
}

impl PairingRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

type CodeGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// In-memory store for pairing records.
///
/// Cloning is cheap and every clone shares the same records. Each operation
/// runs under a single write lock, so two concurrent redemptions of one code
/// cannot both win.
#[derive(Clone)]
pub struct PairingStore {
    records: Arc<RwLock<HashMap<String, PairingRecord>>>,
    ttl: std::time::Duration,
    max_code_attempts: u32,
    code_generator: CodeGenerator,
}

impl PairingStore {
    /// Create a store from the pairing section of the configuration.
    pub fn new(config: &PairingConfig) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            ttl: config.code_ttl,
            max_code_attempts: config.max_code_attempts.max(1),
            code_generator: Arc::new(generate_code),
        }
    }

    /// Builder: override the code lifetime.
    pub fn with_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Builder: override the number of generation attempts per creation.
    pub fn with_max_code_attempts(mut self, attempts: u32) -> Self {
        self.max_code_attempts = attempts.max(1);
        self
    }

    /// Builder: replace the random code source.
    pub fn with_code_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.code_generator = Arc::new(generator);
        self
    }

    /// Lifetime of newly minted codes.
    pub fn ttl(&self) -> std::time::Duration {
        self.ttl
    }

    /// Mint a code for `pubkeys` that can be redeemed once before it expires.
    pub async fn create_pairing(
        &self,
        device_id: String,
        label: String,
        pubkeys: Vec<PubkeyDescriptor>,
        vault_url: String,
    ) -> Result<PairingTicket, PairingError> {
        self.create_pairing_at(device_id, label, pubkeys, vault_url, Utc::now())
            .await
    }

    /// [`create_pairing`](Self::create_pairing) with an explicit clock reading.
    pub async fn create_pairing_at(
        &self,
        device_id: String,
        label: String,
        pubkeys: Vec<PubkeyDescriptor>,
        vault_url: String,
        now: DateTime<Utc>,
    ) -> Result<PairingTicket, PairingError> {
        let expires_at = self.expiry_from(now)?;
        let mut records = self.records.write().await;

        let mut code = None;
        for attempt in 1..=self.max_code_attempts {
            let candidate = (self.code_generator)();
            if !records.contains_key(&candidate) {
                code = Some(candidate);
                break;
            }
            tracing::warn!(
                attempt,
                code = %redact(&candidate),
                "Pairing code collision, regenerating"
            );
        }
        let Some(code) = code else {
            tracing::error!(
                attempts = self.max_code_attempts,
                live_records = records.len(),
                "Could not allocate a unique pairing code"
            );
            return Err(PairingError::CodeSpaceExhausted {
                attempts: self.max_code_attempts,
            });
        };

        let data = PairingData {
            device_id,
            label,
            pubkeys,
            created_at: now,
            expires_at,
            vault_url,
        };

        tracing::info!(
            code = %redact(&code),
            device_id = %data.device_id,
            pubkeys = data.pubkeys.len(),
            %expires_at,
            "Pairing created"
        );

        records.insert(
            code.clone(),
            PairingRecord {
                expires_at,
                used: false,
                data: Some(data),
            },
        );

        Ok(PairingTicket {
            code,
            expires_at,
            expires_in_secs: self.ttl.as_secs(),
        })
    }

    /// Redeem a code, invalidating it in the same step.
    pub async fn consume_pairing(&self, code: &str) -> ConsumeOutcome {
        self.consume_pairing_at(code, Utc::now()).await
    }

    /// [`consume_pairing`](Self::consume_pairing) with an explicit clock reading.
    pub async fn consume_pairing_at(&self, code: &str, now: DateTime<Utc>) -> ConsumeOutcome {
        let mut records = self.records.write().await;

        let Some(record) = records.get_mut(code) else {
            tracing::debug!(code = %redact(code), "Pairing code not found");
            return ConsumeOutcome::NotFound;
        };

        if record.is_expired(now) {
            records.remove(code);
            tracing::debug!(code = %redact(code), "Pairing code expired");
            return ConsumeOutcome::NotFound;
        }

        if record.used {
            tracing::info!(code = %redact(code), "Pairing code already used");
            return ConsumeOutcome::AlreadyUsed;
        }

        record.used = true;
        match record.data.take() {
            Some(data) => {
                tracing::info!(
                    code = %redact(code),
                    device_id = %data.device_id,
                    "Pairing consumed"
                );
                ConsumeOutcome::Consumed(data)
            }
            // A live record always carries its payload.
            None => ConsumeOutcome::AlreadyUsed,
        }
    }

    /// Remove every record whose expiry has passed.
    ///
    /// Returns the number of records removed.
    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now()).await
    }

    /// [`sweep_expired`](Self::sweep_expired) with an explicit clock reading.
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }

    /// Count records by state.
    pub async fn stats(&self) -> PairingStats {
        self.stats_at(Utc::now()).await
    }

    /// [`stats`](Self::stats) with an explicit clock reading.
    pub async fn stats_at(&self, now: DateTime<Utc>) -> PairingStats {
        let records = self.records.read().await;
        let mut stats = PairingStats {
            total: records.len(),
            ..PairingStats::default()
        };
        for record in records.values() {
            if record.is_expired(now) {
                stats.expired += 1;
            } else if record.used {
                stats.consumed += 1;
            } else {
                stats.active += 1;
            }
        }
        stats
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, PairingError> {
        Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(PairingError::ExpiryOutOfRange {
                ttl_ms: self.ttl.as_millis(),
            })
    }
}

impl Default for PairingStore {
    fn default() -> Self {
        Self::new(&PairingConfig::default())
    }
}

impl std::fmt::Debug for PairingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingStore")
            .field("ttl", &self.ttl)
            .field("max_code_attempts", &self.max_code_attempts)
            .finish_non_exhaustive()
    }
}
