//! HTTP gateway for pairing.
//!
//! ```text
//! POST /pairing        ──► rate limit (create) ──► create_pairing
//! GET  /pairing/{code} ──► fixture table ──► rate limit (retrieve) ──► get_pairing
//! GET  /health         ──► health
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
mod server;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::pairing::{FixtureTable, PairingStore};
use crate::rate_limit::RateLimiter;

pub use error::ApiError;
pub use server::PairingServer;

/// Shared services injected into every handler.
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub store: PairingStore,
    pub create_limiter: RateLimiter,
    pub retrieve_limiter: RateLimiter,
    pub fixtures: Arc<FixtureTable>,
    /// Fallback origin reported as `vaultUrl`.
    pub public_url: String,
}

impl GatewayState {
    /// Build fresh, isolated services from configuration.
    pub fn from_config(config: &Config) -> Self {
        let fixtures = if config.pairing.fixtures_enabled {
            FixtureTable::reviewer(&config.gateway.public_url)
        } else {
            FixtureTable::empty()
        };

        Self {
            store: PairingStore::new(&config.pairing),
            create_limiter: RateLimiter::new("pairing_create", config.gateway.create_limit),
            retrieve_limiter: RateLimiter::new(
                "pairing_retrieve",
                config.gateway.retrieve_limit,
            ),
            fixtures: Arc::new(fixtures),
            public_url: config.gateway.public_url.clone(),
        }
    }
}

/// Assemble the pairing routes around `state`.
pub fn router(state: GatewayState) -> Router {
    let create = Router::new()
        .route("/pairing", post(handlers::create_pairing))
        .route_layer(from_fn_with_state(
            state.create_limiter.clone(),
            middleware::rate_limit_middleware,
        ));

    // The last route_layer wraps the others, so fixtures skip the limiter.
    let retrieve = Router::new()
        .route("/pairing/{code}", get(handlers::get_pairing))
        .route_layer(from_fn_with_state(
            state.retrieve_limiter.clone(),
            middleware::rate_limit_middleware,
        ))
        .route_layer(from_fn_with_state(
            Arc::clone(&state.fixtures),
            middleware::fixture_bypass,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(create)
        .merge(retrieve)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
