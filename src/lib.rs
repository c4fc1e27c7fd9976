//! # IPFusion - IP intelligence aggregation engine
//!
//! Queries many independent IP intelligence vendors for a single address,
//! normalizes their JSON into one canonical record and guards the whole
//! thing behind a sliding-window rate limiter.
//!
//! ## Architecture
//!
//! ```text
//! HTTP GET /?ip=..  →  server::handler (validate IP)
//!     ↓
//! limiter::RateLimiter::admit(client)
//!     ↓
//! scheduler::Aggregator::run (sequential | bounded concurrent)
//!     ↓
//! sources::resolve_request → fetcher::SourceFetcher::fetch → sources::normalize
//!     ↓
//! AggregateResponse { ip, results }
//! ```


pub mod config;
pub mod fetcher;
pub mod limiter;
pub mod scheduler;
pub mod server;
pub mod sources;
pub mod types;
pub mod validation;

pub use config::ServerConfig;
pub use fetcher::{HttpFetcher, SourceFetcher};
pub use limiter::RateLimiter;
pub use scheduler::Aggregator;
pub use types::{AggregateResponse, CredentialSet, QueryOrder, QueryOutcome, SourceError};
