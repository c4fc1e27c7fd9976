//! Errors escalated to the request boundary
//!
//! Only these two reach the caller as non-200 responses; every per-source
//! failure stays inline in its `QueryOutcome`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// `ip` missing or not IPv4/IPv6 shaped
    InvalidInput,
    /// Client exceeded its sliding-window allowance
    AdmissionDenied,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput => StatusCode::BAD_REQUEST,
            ApiError::AdmissionDenied => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidInput => write!(f, "Invalid IP"),
            ApiError::AdmissionDenied => write!(f, "Rate limit exceeded"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
