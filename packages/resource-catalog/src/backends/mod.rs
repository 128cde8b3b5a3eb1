//! Storage backend implementations.
//!
//! - `HttpBackend` - REST access to the catalog table, listing procedure and
//!   object listing endpoints
//! - `RateLimitedBackend` - Wrapper that paces boundary calls client-side
//! - `MockBackend` lives in [`crate::testing`]

mod http;
mod rate_limited;

pub use http::HttpBackend;
pub use rate_limited::{BackendExt, RateLimitedBackend};

// Re-export from traits for convenience
pub use crate::traits::backend::StorageBackend;
