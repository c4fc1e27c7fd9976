//! Bounded Fetcher - one deadline-guarded HTTP GET per source
//!
//! The fetcher never fails: transport errors, timeouts, bad statuses and
//! undecodable bodies all come back as a `QueryOutcome` with `error` set.

pub mod decode;

pub use decode::{classify_status, decode_body, strip_control_chars, DecodedBody};

use crate::sources::RequestSpec;
use crate::types::{QueryOutcome, SourceError};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Performs the network leg of a source query
///
/// The scheduler only talks to this trait, so tests can substitute an
/// instrumented fetcher.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, spec: &RequestSpec, timeout: Duration) -> QueryOutcome;
}

/// `reqwest`-backed fetcher shared across requests
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ipfusion/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn execute(&self, spec: &RequestSpec) -> Result<(u16, String), reqwest::Error> {
        let mut request = self.client.get(&spec.url);
        for (name, value) in &spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok((status, text))
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, spec: &RequestSpec, timeout: Duration) -> QueryOutcome {
        let start = Instant::now();
        // Dropping the future on deadline cancels the in-flight call
        let result = tokio::time::timeout(timeout, self.execute(spec)).await;
        let elapsed_millis = elapsed_ms(start);

        let (raw_data, http_status, error) = match result {
            Err(_) => {
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                log::warn!("⏱️  {} timed out after {}ms", spec.source, timeout_ms);
                (
                    None,
                    0,
                    Some(SourceError::Timeout {
                        timeout_ms,
                        url: spec.url.clone(),
                    }),
                )
            }
            Ok(Err(e)) => {
                log::warn!("⚠️  {} transport failure: {}", spec.source, e);
                (
                    None,
                    0,
                    Some(SourceError::Transport {
                        cause: e.to_string(),
                        url: spec.url.clone(),
                    }),
                )
            }
            Ok(Ok((status, text))) => {
                let decoded = decode_body(&text);
                let mut error = decoded.is_invalid().then_some(SourceError::InvalidJson);
                if let Some(label) = classify_status(status) {
                    error = Some(label);
                }
                log::debug!("✅ {} answered {} in {}ms", spec.source, status, elapsed_millis);
                (Some(decoded.into_value()), status, error)
            }
        };

        QueryOutcome {
            source_id: spec.source.as_str().to_string(),
            raw_data,
            standardized: None,
            elapsed_millis,
            http_status,
            error,
        }
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
