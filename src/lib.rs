//! vault-pairing: one-time pairing codes for handing a vault's public keys
//! to a second device.
//!
//! The crate is organised as:
//! - [`pairing`]: code generation, the single-use record store, fixtures,
//!   and the expiry sweeper
//! - [`rate_limit`]: fixed-window per-client request limiter
//! - [`gateway`]: axum routes, middleware and server lifecycle
//! - [`config`]: environment-driven configuration
//! - [`cli`]: command-line entry points

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pairing;
pub mod rate_limit;

pub use config::Config;
pub use error::{Error, Result};
