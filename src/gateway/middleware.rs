//! Request guards for the pairing routes.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::gateway::error::ApiError;
use crate::gateway::models::GetPairingResponse;
use crate::pairing::FixtureTable;
use crate::rate_limit::{RateLimiter, UNKNOWN_CLIENT};

/// Identify the caller for rate limiting.
///
/// Uses the first hop of `X-Forwarded-For`, then `X-Real-IP`. Requests with
/// neither all land in the shared [`UNKNOWN_CLIENT`] bucket.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Reject callers that exhausted their window on this limiter.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(request.headers());
    if limiter.check(&key).await {
        return next.run(request).await;
    }

    let retry_after = limiter.retry_after(&key).await;
    tracing::warn!(
        limiter = limiter.name(),
        client = %key,
        retry_after_ms = retry_after.map(|d| d.as_millis() as u64),
        "Rate limit exceeded"
    );
    ApiError::RateLimited { retry_after }.into_response()
}

/// Answer fixture codes directly, ahead of the limiter and the store.
pub async fn fixture_bypass(
    State(fixtures): State<Arc<FixtureTable>>,
    Path(code): Path<String>,
    request: Request,
    next: Next,
) -> Response {
    match fixtures.get(&code) {
        Some(data) => {
            tracing::debug!(code = %code, "Serving pairing fixture");
            Json(GetPairingResponse::from(data.clone())).into_response()
        }
        None => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_client_key_uses_first_forwarded_hop() {
        let map = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        assert_eq!(client_key(&map), "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_real_ip() {
        let map = headers(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_key(&map), "198.51.100.2");
    }

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.7"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(client_key(&map), "203.0.113.7");
    }

    #[test]
    fn test_client_key_unknown_without_headers() {
        assert_eq!(client_key(&HeaderMap::new()), UNKNOWN_CLIENT);
        let blank = headers(&[("x-forwarded-for", " ")]);
        assert_eq!(client_key(&blank), UNKNOWN_CLIENT);
    }
}
