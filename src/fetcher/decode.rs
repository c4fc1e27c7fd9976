//! Corruption-tolerant body decoding and status classification

use crate::types::SourceError;
use serde_json::{json, Value};

/// Characters of raw body kept when a body cannot be decoded
pub const RAW_SAMPLE_CHARS: usize = 200;

/// How a vendor body was turned into JSON
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    /// Parsed as-is
    Parsed(Value),
    /// Parsed after stripping NUL and C0/C1 control characters
    Sanitized(Value),
    /// Not JSON even after stripping; carries a truncated sample
    Invalid { sample: String },
}

impl DecodedBody {
    pub fn is_invalid(&self) -> bool {
        matches!(self, DecodedBody::Invalid { .. })
    }

    /// JSON to report as the outcome's data
    ///
    /// Invalid bodies become an explicit marker object rather than null.
    pub fn into_value(self) -> Value {
        match self {
            DecodedBody::Parsed(v) | DecodedBody::Sanitized(v) => v,
            DecodedBody::Invalid { sample } => json!({
                "error": "Invalid JSON",
                "rawText": sample,
            }),
        }
    }
}

/// Decode a body, retrying once with control characters stripped
pub fn decode_body(text: &str) -> DecodedBody {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return DecodedBody::Parsed(value);
    }

    let cleaned = strip_control_chars(text);
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        log::debug!(
            "🧽 Body decoded after stripping {} control characters",
            text.chars().count() - cleaned.chars().count()
        );
        return DecodedBody::Sanitized(value);
    }

    DecodedBody::Invalid {
        sample: raw_sample(text),
    }
}

/// Remove U+0000..=U+001F and U+007F..=U+009F
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}'))
        .collect()
}

fn raw_sample(text: &str) -> String {
    let mut chars = text.chars();
    let mut sample: String = chars.by_ref().take(RAW_SAMPLE_CHARS).collect();
    if chars.next().is_some() {
        sample.push_str("...");
    }
    sample
}

/// Coarse error label for a completed response, if any
///
/// Everything outside 403, 429 and 5xx passes through unlabelled,
/// including 2xx bodies that report an application-level error.
pub fn classify_status(status: u16) -> Option<SourceError> {
    match status {
        403 => Some(SourceError::Forbidden),
        429 => Some(SourceError::RateLimited),
        s if s >= 500 => Some(SourceError::ServerError),
        _ => None,
    }
}
