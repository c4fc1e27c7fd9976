//! Vendor registry, corruption quarantine and canonical normalization

pub mod normalizer;
pub mod quarantine;
pub mod registry;

pub use normalizer::normalize;
pub use quarantine::quarantine;
pub use registry::{resolve_request, CredentialPlacement, RequestSpec, SourceConfig, SourceId};
