//! Aggregation Scheduler - fans one IP out to many sources
//!
//! ```text
//! source ids
//!     ↓
//! resolve_request (skip when unknown / key missing)
//!     ↓
//! SourceFetcher::fetch  (sequential, or BoundedPool of MAX_CONCURRENT)
//!     ↓
//! quarantine → normalize (only for clean, unlabelled bodies)
//!     ↓
//! AggregateResponse.results[source id]
//! ```
//!
//! A failing source never aborts its siblings; every requested id gets an
//! outcome.

pub mod pool;

pub use pool::BoundedPool;

use crate::fetcher::SourceFetcher;
use crate::sources::{normalize, quarantine, resolve_request, RequestSpec};
use crate::types::{AggregateResponse, CredentialSet, QueryOrder, QueryOutcome, SourceError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Runs source queries for one request under the chosen policy
pub struct Aggregator {
    fetcher: Arc<dyn SourceFetcher>,
    timeout: Duration,
    pool: BoundedPool,
}

impl Aggregator {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            timeout,
            pool: BoundedPool::new(max_concurrent),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.pool.limit()
    }

    /// Query every id in `source_ids` for `ip`
    pub async fn run(
        &self,
        ip: &str,
        source_ids: &[String],
        order: QueryOrder,
        credentials: &CredentialSet,
    ) -> AggregateResponse {
        log::info!(
            "🔎 Querying {} sources for {} ({})",
            source_ids.len(),
            ip,
            order.as_str()
        );

        let mut results = BTreeMap::new();

        match order {
            QueryOrder::Sequential => {
                for source_id in source_ids {
                    let outcome = self.query_source(source_id, ip, credentials).await;
                    results.insert(source_id.clone(), outcome);
                }
            }
            QueryOrder::Concurrent => {
                let finished = self
                    .pool
                    .run(source_ids.iter().cloned(), |source_id| {
                        let fetcher = Arc::clone(&self.fetcher);
                        let spec = resolve_request(&source_id, ip, credentials);
                        let timeout = self.timeout;
                        async move {
                            let outcome =
                                complete(fetcher.as_ref(), &source_id, spec, timeout).await;
                            (source_id, outcome)
                        }
                    })
                    .await;

                results.extend(finished);

                for source_id in source_ids {
                    if !results.contains_key(source_id) {
                        results.insert(
                            source_id.clone(),
                            QueryOutcome::skipped(source_id.as_str(), SourceError::WorkerFailed),
                        );
                    }
                }
            }
        }

        let failed = results.values().filter(|o| !o.is_success()).count();
        log::info!(
            "📊 {} done: {} ok, {} with errors",
            ip,
            results.len() - failed,
            failed
        );

        AggregateResponse {
            ip: ip.to_string(),
            results,
        }
    }

    /// Resolve, fetch and normalize a single source
    pub async fn query_source(
        &self,
        source_id: &str,
        ip: &str,
        credentials: &CredentialSet,
    ) -> QueryOutcome {
        let spec = resolve_request(source_id, ip, credentials);
        complete(self.fetcher.as_ref(), source_id, spec, self.timeout).await
    }
}

async fn complete(
    fetcher: &dyn SourceFetcher,
    source_id: &str,
    spec: Option<RequestSpec>,
    timeout: Duration,
) -> QueryOutcome {
    let Some(spec) = spec else {
        log::debug!("⏭️  Skipping {}: unknown source or missing key", source_id);
        return QueryOutcome::skipped(source_id, SourceError::MissingConfigOrKey);
    };

    let mut outcome = fetcher.fetch(&spec, timeout).await;
    outcome.source_id = source_id.to_string();

    if outcome.error.is_none() {
        if let Some(data) = outcome.raw_data.as_ref().filter(|d| !declares_error(d)) {
            outcome.standardized = Some(normalize(spec.source, &quarantine(data)));
        }
    }

    outcome
}

/// Vendor body carries a truthy top-level `error` member
fn declares_error(data: &Value) -> bool {
    match data.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}
