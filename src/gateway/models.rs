//! Request and response bodies for the pairing endpoints.
//!
//! Field names follow the camelCase wire format the vault front-end and the
//! mobile app already speak.

use serde::{Deserialize, Serialize};

use crate::pairing::{PairingData, PairingStats, PairingTicket, PubkeyDescriptor};

/// Version tag of the payload returned to the consuming device.
pub const PAIRING_PAYLOAD_VERSION: u32 = 1;

/// Body of `POST /pairing`.
///
/// Every field is optional at the serde level so that a missing field is
/// reported by [`validate`](Self::validate) with its name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePairingRequest {
    pub device_id: Option<String>,
    pub label: Option<String>,
    pub pubkeys: Option<Vec<PubkeyInput>>,
}

/// A pubkey entry as submitted, before presence checks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubkeyInput {
    pub pubkey: Option<String>,
    pub path_master: Option<String>,
    pub networks: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPairing {
    pub device_id: String,
    pub label: String,
    pub pubkeys: Vec<PubkeyDescriptor>,
}

impl CreatePairingRequest {
    /// Check required fields, returning the first problem found.
    pub fn validate(self) -> Result<ValidatedPairing, String> {
        let device_id = required(self.device_id, "deviceId")?;
        let label = required(self.label, "label")?;

        let inputs = match self.pubkeys {
            Some(pubkeys) if !pubkeys.is_empty() => pubkeys,
            _ => return Err("pubkeys must be a non-empty array".to_string()),
        };

        let mut pubkeys = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.into_iter().enumerate() {
            let pubkey = required(input.pubkey, &format!("pubkeys[{}].pubkey", index))?;
            let path_master =
                required(input.path_master, &format!("pubkeys[{}].pathMaster", index))?;
            let networks = match input.networks {
                Some(networks) if !networks.is_empty() => networks,
                _ => {
                    return Err(format!(
                        "pubkeys[{}].networks must be a non-empty array",
                        index
                    ));
                }
            };
            pubkeys.push(PubkeyDescriptor {
                pubkey,
                path_master,
                networks,
                extra: input.extra,
            });
        }

        Ok(ValidatedPairing {
            device_id,
            label,
            pubkeys,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}

/// Success body of `POST /pairing`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePairingResponse {
    pub success: bool,
    pub code: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
    /// Seconds.
    pub expires_in: u64,
}

impl From<PairingTicket> for CreatePairingResponse {
    fn from(ticket: PairingTicket) -> Self {
        Self {
            success: true,
            code: ticket.code,
            expires_at: ticket.expires_at.timestamp_millis(),
            expires_in: ticket.expires_in_secs,
        }
    }
}

/// Payload handed to the consuming device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingPayload {
    pub version: u32,
    pub device_id: String,
    pub label: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    pub vault_url: String,
    pub pubkeys: Vec<PubkeyDescriptor>,
}

impl From<PairingData> for PairingPayload {
    fn from(data: PairingData) -> Self {
        Self {
            version: PAIRING_PAYLOAD_VERSION,
            device_id: data.device_id,
            label: data.label,
            timestamp: data.created_at.timestamp_millis(),
            vault_url: data.vault_url,
            pubkeys: data.pubkeys,
        }
    }
}

/// Success body of `GET /pairing/{code}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPairingResponse {
    pub success: bool,
    pub data: PairingPayload,
}

impl From<PairingData> for GetPairingResponse {
    fn from(data: PairingData) -> Self {
        Self {
            success: true,
            data: data.into(),
        }
    }
}

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pairings: PairingStats,
}
