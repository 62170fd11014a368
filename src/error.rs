//! Error types for vault-pairing.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pairing error: {0}")]
    Pairing(#[from] PairingError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Pairing store errors.
///
/// Not-found, expired and already-used are not errors at this layer; they are
/// reported through [`crate::pairing::ConsumeOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum PairingError {
    #[error("Could not allocate a unique pairing code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },

    #[error("Pairing TTL of {ttl_ms} ms puts the expiry out of range")]
    ExpiryOutOfRange { ttl_ms: u128 },
}

/// HTTP gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway failed to start: {reason}")]
    StartupFailed { reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
