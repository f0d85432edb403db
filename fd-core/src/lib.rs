//! FreelanceDesk Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other FreelanceDesk crates:
//! - Application configuration (backend URL, account, automation settings)
//! - Global error types covering all error categories
//! - Structured logging with tracing
//! - Data directory helpers
//! - Common constants and date helpers

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;
pub mod dates;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{FdError, FdResult};
pub use logging::init_logging;
