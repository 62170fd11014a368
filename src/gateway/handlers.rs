//! Pairing endpoint handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
};

use crate::gateway::GatewayState;
use crate::gateway::error::ApiError;
use crate::gateway::models::{
    CreatePairingRequest, CreatePairingResponse, GetPairingResponse, HealthResponse,
};
use crate::pairing::{ConsumeOutcome, is_valid_code_format};

/// `POST /pairing`
pub async fn create_pairing(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Json<CreatePairingRequest>, JsonRejection>,
) -> Result<Json<CreatePairingResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let pairing = request.validate().map_err(ApiError::Validation)?;
    let vault_url = vault_url_from_headers(&headers, &state.public_url);

    let ticket = state
        .store
        .create_pairing(pairing.device_id, pairing.label, pairing.pubkeys, vault_url)
        .await?;

    Ok(Json(ticket.into()))
}

/// `GET /pairing/{code}`
pub async fn get_pairing(
    State(state): State<GatewayState>,
    Path(code): Path<String>,
) -> Result<Json<GetPairingResponse>, ApiError> {
    if !is_valid_code_format(&code) {
        return Err(ApiError::Validation(
            "Invalid pairing code format. Expected 8 characters (A-Z, 0-9).".to_string(),
        ));
    }

    match state.store.consume_pairing(&code).await {
        ConsumeOutcome::Consumed(data) => Ok(Json(data.into())),
        ConsumeOutcome::NotFound => Err(ApiError::NotFound),
        ConsumeOutcome::AlreadyUsed => Err(ApiError::AlreadyUsed),
    }
}

/// `GET /health`
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        pairings: state.store.stats().await,
    })
}

/// Work out the origin of the vault that is creating a pairing.
///
/// Prefers `Origin`, then a URL rebuilt from the (forwarded) host headers,
/// then the configured public URL.
pub fn vault_url_from_headers(headers: &HeaderMap, fallback: &str) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(origin) = header("origin")
        && origin != "null"
    {
        return origin.trim_end_matches('/').to_string();
    }

    if let Some(host) = header("x-forwarded-host").or_else(|| header("host")) {
        let host = host.split(',').next().unwrap_or(host).trim();
        let proto = header("x-forwarded-proto")
            .and_then(|p| p.split(',').next())
            .map(str::trim)
            .unwrap_or("http");
        return format!("{}://{}", proto, host);
    }

    fallback.to_string()
}
