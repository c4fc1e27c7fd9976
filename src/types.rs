//! Core data structures shared by the fetcher, scheduler and server

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Normalized vendor record
///
/// Every field is optional; a vendor only populates what it reports.
/// Absent fields are omitted from the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraud_score: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abuse_score: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpn: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tor: Option<bool>,
}

impl CanonicalFields {
    pub fn is_empty(&self) -> bool {
        *self == CanonicalFields::default()
    }
}

/// Per-source failure, reported inline in the outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Unknown source id, or a key-gated source called without its key
    MissingConfigOrKey,
    /// Vendor answered 403
    Forbidden,
    /// Vendor answered 429
    RateLimited,
    /// Vendor answered 5xx
    ServerError,
    /// Body was not JSON, even after control-character stripping
    InvalidJson,
    /// Deadline elapsed before the response completed
    Timeout { timeout_ms: u64, url: String },
    /// Connection, TLS or body read failure
    Transport { cause: String, url: String },
    /// The pool task running this source died
    WorkerFailed,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::MissingConfigOrKey => write!(f, "missing_config_or_key"),
            SourceError::Forbidden => write!(f, "forbidden"),
            SourceError::RateLimited => write!(f, "rate_limited"),
            SourceError::ServerError => write!(f, "server_error"),
            SourceError::InvalidJson => write!(f, "invalid_json"),
            SourceError::Timeout { timeout_ms, url } => {
                write!(f, "timeout after {}ms (url: {})", timeout_ms, url)
            }
            SourceError::Transport { cause, url } => write!(f, "{} (url: {})", cause, url),
            SourceError::WorkerFailed => write!(f, "worker_failed"),
        }
    }
}

impl std::error::Error for SourceError {}

impl Serialize for SourceError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of querying one source for one request
///
/// Field names on the wire follow the shape the display shell consumes.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    #[serde(rename = "source")]
    pub source_id: String,
    #[serde(rename = "data")]
    pub raw_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standardized: Option<CanonicalFields>,
    #[serde(rename = "elapsed")]
    pub elapsed_millis: u64,
    #[serde(rename = "status")]
    pub http_status: u16,
    pub error: Option<SourceError>,
}

impl QueryOutcome {
    /// Outcome for a source that never reached the network
    pub fn skipped(source_id: impl Into<String>, error: SourceError) -> Self {
        Self {
            source_id: source_id.into(),
            raw_data: None,
            standardized: None,
            elapsed_millis: 0,
            http_status: 0,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Scheduling policy for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryOrder {
    Sequential,
    #[default]
    Concurrent,
}

impl QueryOrder {
    /// Anything other than `sequential` means the default concurrent mode
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => QueryOrder::Sequential,
            _ => QueryOrder::Concurrent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOrder::Sequential => "sequential",
            QueryOrder::Concurrent => "concurrent",
        }
    }
}

/// Caller-supplied secrets for one request, keyed by source id
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    keys: HashMap<String, String>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a key; blank values are treated as absent
    pub fn insert(&mut self, source_id: &str, key: impl Into<String>) {
        let key = key.into();
        if key.trim().is_empty() {
            return;
        }
        self.keys.insert(source_id.to_string(), key);
    }

    pub fn get(&self, source_id: &str) -> Option<&str> {
        self.keys.get(source_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Response body for a successful aggregation
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResponse {
    pub ip: String,
    pub results: BTreeMap<String, QueryOutcome>,
}
