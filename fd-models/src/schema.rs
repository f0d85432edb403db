//! Database schema definitions and table creation.
//!
//! Every business table carries a `user_id` column; all reads and writes in
//! this crate filter on it. Identifiers are opaque TEXT (UUID v4 when
//! generated locally) so rows can be mirrored from the hosted backend as-is.

use rusqlite::Connection;
use fd_core::error::{FdError, FdResult};
use tracing::info;

/// Tables holding account-scoped business records, in dependency order.
pub const ENTITY_TABLES: &[&str] = &[
    "clients",
    "projects",
    "tasks",
    "invoices",
    "contracts",
    "automations",
];

/// Create all database tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> FdResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| FdError::Database(format!("failed to create schema: {e}")))?;
    info!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset).
pub fn drop_tables(conn: &Connection) -> FdResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS outbox;
         DROP TABLE IF EXISTS automations;
         DROP TABLE IF EXISTS contracts;
         DROP TABLE IF EXISTS invoices;
         DROP TABLE IF EXISTS tasks;
         DROP TABLE IF EXISTS projects;
         DROP TABLE IF EXISTS clients;
         DROP TABLE IF EXISTS users;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| FdError::Database(format!("failed to drop tables: {e}")))?;
    Ok(())
}

/// Complete SQL schema for all tables.
const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Accounts
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE,
    full_name       TEXT,
    company         TEXT,
    created_at      TEXT NOT NULL
);

-- Clients
CREATE TABLE IF NOT EXISTS clients (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    email           TEXT,
    company         TEXT,
    phone           TEXT,
    notes           TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_clients_user ON clients(user_id);
CREATE INDEX IF NOT EXISTS idx_clients_name ON clients(user_id, name);

-- Projects
CREATE TABLE IF NOT EXISTS projects (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    client_id       TEXT REFERENCES clients(id) ON DELETE SET NULL,
    name            TEXT NOT NULL,
    description     TEXT,
    status          TEXT NOT NULL DEFAULT 'planning',
    budget          REAL,
    start_date      TEXT,
    end_date        TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projects_user ON projects(user_id);
CREATE INDEX IF NOT EXISTS idx_projects_client ON projects(client_id);
CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(user_id, status);

-- Tasks
CREATE TABLE IF NOT EXISTS tasks (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    project_id      TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title           TEXT NOT NULL,
    description     TEXT,
    status          TEXT NOT NULL DEFAULT 'todo',
    priority        TEXT NOT NULL DEFAULT 'medium',
    due_date        TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(user_id, status);

-- Invoices
CREATE TABLE IF NOT EXISTS invoices (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    client_id       TEXT REFERENCES clients(id) ON DELETE SET NULL,
    project_id      TEXT REFERENCES projects(id) ON DELETE SET NULL,
    invoice_number  TEXT NOT NULL,
    amount          REAL NOT NULL DEFAULT 0,
    status          TEXT NOT NULL DEFAULT 'draft',
    issue_date      TEXT,
    due_date        TEXT,
    paid_at         TEXT,
    created_at      TEXT NOT NULL,
    UNIQUE(user_id, invoice_number)
);

CREATE INDEX IF NOT EXISTS idx_invoices_user ON invoices(user_id);
CREATE INDEX IF NOT EXISTS idx_invoices_status ON invoices(user_id, status);

-- Contracts
CREATE TABLE IF NOT EXISTS contracts (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    client_id       TEXT REFERENCES clients(id) ON DELETE SET NULL,
    project_id      TEXT REFERENCES projects(id) ON DELETE SET NULL,
    title           TEXT NOT NULL,
    content         TEXT,
    value           REAL,
    status          TEXT NOT NULL DEFAULT 'draft',
    start_date      TEXT,
    end_date        TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contracts_user ON contracts(user_id);

-- Automations
CREATE TABLE IF NOT EXISTS automations (
    id                  TEXT PRIMARY KEY,
    user_id             TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name                TEXT NOT NULL,
    description         TEXT,
    trigger_type        TEXT NOT NULL,
    is_active           INTEGER NOT NULL DEFAULT 1,
    execution_count     INTEGER NOT NULL DEFAULT 0,
    last_executed_at    TEXT,
    created_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_automations_user ON automations(user_id);
"#;
