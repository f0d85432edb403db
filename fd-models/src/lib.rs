//! FreelanceDesk Models - Database schema, models, migrations, and queries.
//!
//! This crate owns local persistence: SQLite initialization and pooling,
//! account-scoped entity models, versioned migrations, and the projection
//! and aggregate queries used by the automation dispatcher and dashboard.

pub mod db;
pub mod schema;
pub mod models;
pub mod queries;
pub mod migrations;

// Re-export key types
pub use db::{Database, DatabaseStats, DbConn, DbPool};
pub use models::user::User;
pub use models::client::Client;
pub use models::project::Project;
pub use models::task::Task;
pub use models::invoice::Invoice;
pub use models::contract::Contract;
pub use models::automation::Automation;
pub use models::outbox::OutboxEntry;
pub use queries::RowMap;
