//! Entity model definitions.
//!
//! Each model maps one table. Field names match the column names of both the
//! local schema and the hosted backend, so rows fetched over HTTP deserialize
//! straight into these structs with serde.

pub mod user;
pub mod client;
pub mod project;
pub mod task;
pub mod invoice;
pub mod contract;
pub mod automation;
pub mod outbox;

use fd_core::error::{FdError, FdResult};

/// Generate a new opaque record identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Turn a `query_row` result into `Ok(None)` when no row matched.
pub(crate) fn optional<T>(result: rusqlite::Result<T>) -> FdResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(FdError::Database(e.to_string())),
    }
}

/// Map any rusqlite error into the database error category.
pub(crate) fn db_err(e: rusqlite::Error) -> FdError {
    FdError::Database(e.to_string())
}

/// Reject empty required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> FdResult<()> {
    if value.trim().is_empty() {
        Err(FdError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}
