//! Query endpoint: validate → admit → aggregate → serialize

use super::error::ApiError;
use super::AppState;
use crate::sources::SourceId;
use crate::types::{CredentialSet, QueryOrder};
use crate::validation::is_valid_ip;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::collections::HashMap;

/// Client identity used when the trusted header is absent
pub const UNKNOWN_CLIENT: &str = "unknown";

/// `GET ?ip=..&api=..&order=..&<source>_key=..`
///
/// Responses are always identity-encoded; `Accept-Encoding` is not
/// consulted.
pub async fn query_ip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let ip = params
        .get("ip")
        .filter(|ip| is_valid_ip(ip))
        .ok_or(ApiError::InvalidInput)?;

    let client_id = client_identity(&headers, &state.client_ip_header);
    if !state.limiter.admit(&client_id) {
        log::warn!("🚫 Rate limit exceeded for client {}", client_id);
        return Err(ApiError::AdmissionDenied);
    }

    let source_ids = requested_sources(&params);
    let order = params
        .get("order")
        .map(|s| QueryOrder::parse(s))
        .unwrap_or_default();
    let credentials = credentials_from(&params);

    let response = state
        .aggregator
        .run(ip, &source_ids, order, &credentials)
        .await;

    Ok((
        StatusCode::OK,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(response),
    )
        .into_response())
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Trusted connecting-IP header, or `unknown`
pub fn client_identity(headers: &HeaderMap, header_name: &str) -> String {
    headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Single lower-cased `api`, or every registered source
pub fn requested_sources(params: &HashMap<String, String>) -> Vec<String> {
    match params.get("api").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(api) => vec![api.to_ascii_lowercase()],
        None => SourceId::ALL.iter().map(|id| id.as_str().to_string()).collect(),
    }
}

/// Collect `<source>_key` parameters for key-gated sources
pub fn credentials_from(params: &HashMap<String, String>) -> CredentialSet {
    let mut credentials = CredentialSet::new();
    for id in SourceId::ALL.iter().filter(|id| id.config().requires_key()) {
        if let Some(key) = params.get(&format!("{}_key", id.as_str())) {
            credentials.insert(id.as_str(), key.as_str());
        }
    }
    credentials
}
