//! Static pairing fixtures for review and test pipelines.
//!
//! A fixture code is answered from this table before the real store or the
//! retrieval rate limiter is consulted. Fixture codes never expire and are
//! never invalidated.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::pairing::store::{PairingData, PubkeyDescriptor};

/// Permanent reviewer code. It contains `0`, which generated codes never do,
/// so it can never shadow a real pairing.
pub const REVIEWER_CODE: &str = "TEST0000";

/// Creation timestamp reported for the reviewer fixture (2024-01-01T00:00:00Z).
const REVIEWER_TIMESTAMP_MS: i64 = 1_704_067_200_000;

/// Lookup table of fixed pairing payloads keyed by code.
#[derive(Debug, Clone, Default)]
pub struct FixtureTable {
    entries: HashMap<String, PairingData>,
}

impl FixtureTable {
    /// A table with no fixtures; every lookup falls through.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard table holding the reviewer fixture.
    pub fn reviewer(vault_url: &str) -> Self {
        Self::empty().with_fixture(REVIEWER_CODE, reviewer_payload(vault_url))
    }

    /// Builder: add or replace a fixture.
    pub fn with_fixture(mut self, code: &str, data: PairingData) -> Self {
        self.entries.insert(code.to_string(), data);
        self
    }

    pub fn get(&self, code: &str) -> Option<&PairingData> {
        self.entries.get(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn reviewer_payload(vault_url: &str) -> PairingData {
    let created_at = DateTime::<Utc>::from_timestamp_millis(REVIEWER_TIMESTAMP_MS)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    PairingData {
        device_id: "keepkey-review-device".to_string(),
        label: "KeepKey Review".to_string(),
        pubkeys: vec![
            PubkeyDescriptor {
                pubkey: "xpub6D1AabNHCupeiLM65ZR9UStMhJ1vCpyV4XbZdyhMZBiJXALQtmn9p42VTQckoHVn8WNqS7dqnJokZHAHcHGoaQgmv8D45oNUKx6DZMNZBCd".to_string(),
                path_master: "m/84'/0'/0'".to_string(),
                networks: vec!["bip122:000000000019d6689c085ae165831e93".to_string()],
                extra: serde_json::Map::new(),
            },
            PubkeyDescriptor {
                pubkey: "0x141D9959cAe3853b035000490C03991eB70Fc4aC".to_string(),
                path_master: "m/44'/60'/0'/0/0".to_string(),
                networks: vec!["eip155:1".to_string(), "eip155:*".to_string()],
                extra: serde_json::Map::new(),
            },
        ],
        created_at,
        expires_at: DateTime::<Utc>::MAX_UTC,
        vault_url: vault_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::code::CODE_ALPHABET;

    #[test]
    fn test_reviewer_table_serves_fixed_payload() {
        let table = FixtureTable::reviewer("https://vault.example.com");
        assert_eq!(table.len(), 1);

        let data = table.get(REVIEWER_CODE).expect("reviewer fixture");
        assert_eq!(data.device_id, "keepkey-review-device");
        assert_eq!(data.pubkeys.len(), 2);
        assert_eq!(data.vault_url, "https://vault.example.com");
        assert_eq!(data.created_at.timestamp_millis(), REVIEWER_TIMESTAMP_MS);
    }

    #[test]
    fn test_lookup_is_repeatable() {
        let table = FixtureTable::reviewer("http://localhost:3000");
        for _ in 0..5 {
            assert!(table.get(REVIEWER_CODE).is_some());
        }
    }

    #[test]
    fn test_empty_table_has_no_entries() {
        let table = FixtureTable::empty();
        assert!(table.is_empty());
        assert!(table.get(REVIEWER_CODE).is_none());
    }

    #[test]
    fn test_reviewer_code_cannot_be_generated() {
        assert!(
            REVIEWER_CODE
                .bytes()
                .any(|b| !CODE_ALPHABET.contains(&b))
        );
    }
}
