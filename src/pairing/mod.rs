//! One-time pairing between a vault and a second device.
//!
//! The vault publishes its public keys under a short code; the other device
//! redeems the code once to import them. Codes expire after a fixed TTL and
//! a background sweeper reclaims what is left behind.

pub mod code;
pub mod fixtures;
mod store;
mod sweeper;

pub use code::{CODE_ALPHABET, CODE_LENGTH, generate_code, is_valid_code_format};
pub use fixtures::{FixtureTable, REVIEWER_CODE};
pub use store::{
    ConsumeOutcome, PairingData, PairingStats, PairingStore, PairingTicket, PubkeyDescriptor,
};
pub use sweeper::{PairingSweeper, SweepResult};
