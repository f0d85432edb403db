//! FreelanceDesk API - HTTP client for the hosted backend.
//!
//! The backend exposes a PostgREST-style row API under `/rest/v1`, an auth
//! API under `/auth/v1`, and edge functions under `/functions/v1`. This crate
//! handles authentication headers, the query-string filter syntax, error
//! bodies, and transport retry with exponential backoff.

pub mod client;
pub mod endpoints;
pub mod query;
pub mod response;

// Re-export key types
pub use client::{ApiClient, RetryConfig};
pub use endpoints::auth::AuthUser;
pub use endpoints::functions::FunctionInvocation;
pub use query::Query;
pub use response::{BackendError, ContentRange};
