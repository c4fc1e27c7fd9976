//! HTTP surface: router, shared state and the query handler

pub mod error;
pub mod handler;

pub use error::ApiError;
pub use handler::{healthz, query_ip};

use crate::config::ServerConfig;
use crate::fetcher::SourceFetcher;
use crate::limiter::RateLimiter;
use crate::scheduler::Aggregator;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// State shared by every request
///
/// The limiter is the only mutable piece; the aggregator and registry are
/// read-only once built.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub limiter: Arc<RateLimiter>,
    pub client_ip_header: Arc<str>,
}

impl AppState {
    pub fn new(config: &ServerConfig, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self {
            aggregator: Arc::new(Aggregator::new(
                fetcher,
                config.fetch_timeout(),
                config.max_concurrent,
            )),
            limiter: Arc::new(RateLimiter::new(config.rate_limit, config.rate_window())),
            client_ip_header: Arc::from(config.client_ip_header.as_str()),
        }
    }
}

/// `GET /` answers IP queries and `GET /healthz` liveness
///
/// Other methods on `/` get 405 and other paths 404, before any admission
/// check or upstream fetch.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(query_ip))
        .route("/healthz", get(healthz))
        .with_state(state)
}
