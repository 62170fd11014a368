//! Service configuration.
//!
//! Every tunable is read from the environment (after `.env` is loaded by the
//! binary). Unset keys fall back to the defaults below; set-but-invalid keys
//! are reported as [`ConfigError::InvalidValue`] naming the key.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::error::ConfigError;

/// Default pairing code lifetime (15 minutes).
pub const DEFAULT_CODE_TTL_MS: u64 = 900_000;
/// Default interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;
/// Default number of code generation attempts before giving up.
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 10;
/// Default rate-limit window for both pairing endpoints.
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;
/// Default per-window budget for pairing creation.
pub const DEFAULT_CREATE_MAX_REQUESTS: u32 = 5;
/// Default per-window budget for pairing retrieval.
pub const DEFAULT_RETRIEVE_MAX_REQUESTS: u32 = 10;
/// Upper bound for every millisecond setting (365 days).
pub const MAX_DURATION_MS: u64 = 31_536_000_000;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";

/// Fixed-window limiter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitConfig {
    /// Requests accepted per window and client key.
    pub max_requests: u32,
    /// Window length.
    #[serde(rename = "window_ms", serialize_with = "serialize_millis")]
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Budget for `POST /pairing` (5 per minute).
    pub fn create_default() -> Self {
        Self::new(
            DEFAULT_CREATE_MAX_REQUESTS,
            Duration::from_millis(DEFAULT_RATE_LIMIT_WINDOW_MS),
        )
    }

    /// Budget for `GET /pairing/{code}` (10 per minute).
    pub fn retrieve_default() -> Self {
        Self::new(
            DEFAULT_RETRIEVE_MAX_REQUESTS,
            Duration::from_millis(DEFAULT_RATE_LIMIT_WINDOW_MS),
        )
    }
}

/// Pairing store settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairingConfig {
    /// How long a code stays redeemable.
    #[serde(rename = "code_ttl_ms", serialize_with = "serialize_millis")]
    pub code_ttl: Duration,
    /// How often expired records are swept.
    #[serde(rename = "sweep_interval_ms", serialize_with = "serialize_millis")]
    pub sweep_interval: Duration,
    /// Collision retries before `create_pairing` gives up.
    pub max_code_attempts: u32,
    /// Serve the reserved reviewer code from the fixture table.
    pub fixtures_enabled: bool,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_millis(DEFAULT_CODE_TTL_MS),
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
            fixtures_enabled: true,
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Fallback `vaultUrl` when the request carries no usable origin headers.
    pub public_url: String,
    pub create_limit: RateLimitConfig,
    pub retrieve_limit: RateLimitConfig,
}

impl GatewayConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            create_limit: RateLimitConfig::create_default(),
            retrieve_limit: RateLimitConfig::retrieve_default(),
        }
    }
}

/// Full service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub pairing: PairingConfig,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Lets tests supply values without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let host = env
            .parse::<IpAddr>("GATEWAY_HOST")?
            .unwrap_or_else(|| IpAddr::from([127, 0, 0, 1]));
        let port = env.parse::<u16>("GATEWAY_PORT")?.unwrap_or(DEFAULT_PORT);

        let public_url = env
            .get("VAULT_PUBLIC_URL")
            .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string());
        validate_public_url(&public_url)?;

        let create_limit = RateLimitConfig::new(
            env.positive_u32("PAIRING_CREATE_RATE_LIMIT_MAX", DEFAULT_CREATE_MAX_REQUESTS)?,
            env.positive_millis(
                "PAIRING_CREATE_RATE_LIMIT_WINDOW_MS",
                DEFAULT_RATE_LIMIT_WINDOW_MS,
            )?,
        );
        let retrieve_limit = RateLimitConfig::new(
            env.positive_u32(
                "PAIRING_RETRIEVE_RATE_LIMIT_MAX",
                DEFAULT_RETRIEVE_MAX_REQUESTS,
            )?,
            env.positive_millis(
                "PAIRING_RETRIEVE_RATE_LIMIT_WINDOW_MS",
                DEFAULT_RATE_LIMIT_WINDOW_MS,
            )?,
        );

        let pairing = PairingConfig {
            code_ttl: env.positive_millis("PAIRING_CODE_TTL_MS", DEFAULT_CODE_TTL_MS)?,
            sweep_interval: env
                .positive_millis("PAIRING_SWEEP_INTERVAL_MS", DEFAULT_SWEEP_INTERVAL_MS)?,
            max_code_attempts: env
                .positive_u32("PAIRING_MAX_CODE_ATTEMPTS", DEFAULT_MAX_CODE_ATTEMPTS)?,
            fixtures_enabled: env.parse_bool("PAIRING_FIXTURES_ENABLED")?.unwrap_or(true),
        };

        Ok(Self {
            gateway: GatewayConfig {
                host,
                port,
                public_url,
                create_limit,
                retrieve_limit,
            },
            pairing,
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value, with empty strings treated as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{}': {}", raw, e),
                })
            })
            .transpose()
    }

    fn positive_u32(&self, key: &str, default: u32) -> Result<u32, ConfigError> {
        let value = self.parse::<u32>(key)?.unwrap_or(default);
        if value == 0 {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    }

    fn positive_millis(&self, key: &str, default_ms: u64) -> Result<Duration, ConfigError> {
        let value = self.parse::<u64>(key)?.unwrap_or(default_ms);
        if value == 0 {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if value > MAX_DURATION_MS {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("must be at most {} (365 days)", MAX_DURATION_MS),
            });
        }
        Ok(Duration::from_millis(value))
    }

    fn parse_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{}' is not a boolean", raw),
                }),
            },
        }
    }
}

fn validate_public_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: "VAULT_PUBLIC_URL".to_string(),
        message: format!("'{}': {}", raw, e),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: "VAULT_PUBLIC_URL".to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(())
}

fn serialize_millis<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.pairing.code_ttl, Duration::from_secs(900));
        assert_eq!(config.pairing.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.gateway.create_limit.max_requests, 5);
        assert_eq!(config.gateway.retrieve_limit.max_requests, 10);
        assert_eq!(config.gateway.addr().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = load(&[
            ("GATEWAY_HOST", "0.0.0.0"),
            ("GATEWAY_PORT", "8080"),
            ("VAULT_PUBLIC_URL", "https://vault.example.com"),
            ("PAIRING_CODE_TTL_MS", "1000"),
            ("PAIRING_CREATE_RATE_LIMIT_MAX", "2"),
            ("PAIRING_RETRIEVE_RATE_LIMIT_WINDOW_MS", "5000"),
            ("PAIRING_FIXTURES_ENABLED", "false"),
        ])
        .unwrap();

        assert_eq!(config.gateway.addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.gateway.public_url, "https://vault.example.com");
        assert_eq!(config.pairing.code_ttl, Duration::from_secs(1));
        assert_eq!(config.gateway.create_limit.max_requests, 2);
        assert_eq!(
            config.gateway.retrieve_limit.window,
            Duration::from_secs(5)
        );
        assert!(!config.pairing.fixtures_enabled);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = load(&[("GATEWAY_PORT", "   ")]).unwrap();
        assert_eq!(config.gateway.port, 3000);
    }

    #[test]
    fn test_invalid_port_names_the_key() {
        let err = load(&[("GATEWAY_PORT", "not-a-port")]).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "GATEWAY_PORT"),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let err = load(&[("PAIRING_CODE_TTL_MS", "0")]).unwrap_err();
        assert!(err.to_string().contains("PAIRING_CODE_TTL_MS"));
    }

    #[test]
    fn test_oversized_durations_are_rejected() {
        for key in [
            "PAIRING_CODE_TTL_MS",
            "PAIRING_SWEEP_INTERVAL_MS",
            "PAIRING_CREATE_RATE_LIMIT_WINDOW_MS",
        ] {
            let err = load(&[(key, "9000000000000000000")]).unwrap_err();
            assert!(err.to_string().contains(key), "{}", err);
        }

        let max = MAX_DURATION_MS.to_string();
        let config = load(&[("PAIRING_CODE_TTL_MS", max.as_str())]).unwrap();
        assert_eq!(config.pairing.code_ttl, Duration::from_millis(MAX_DURATION_MS));
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        assert!(load(&[("PAIRING_RETRIEVE_RATE_LIMIT_MAX", "0")]).is_err());
    }

    #[test]
    fn test_bad_boolean_is_rejected() {
        assert!(load(&[("PAIRING_FIXTURES_ENABLED", "maybe")]).is_err());
    }

    #[test]
    fn test_public_url_must_be_http() {
        assert!(load(&[("VAULT_PUBLIC_URL", "ftp://vault.example.com")]).is_err());
        assert!(load(&[("VAULT_PUBLIC_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_serializes_durations_as_millis() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["pairing"]["code_ttl_ms"], 900_000);
        assert_eq!(json["gateway"]["create_limit"]["window_ms"], 60_000);
    }
}
