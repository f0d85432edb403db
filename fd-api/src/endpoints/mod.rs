//! API endpoint modules organized by category.
//!
//! Each module adds typed methods to [`ApiClient`](crate::client::ApiClient)
//! for one part of the backend.

pub mod auth;
pub mod functions;
pub mod rows;
