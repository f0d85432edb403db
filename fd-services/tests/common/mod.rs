//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use fd_core::config::{AppConfig, ConfigHandle, DatabaseConfig};
use fd_models::Database;
use fd_services::dispatcher::AutomationDispatcher;
use fd_services::event_bus::EventBus;
use fd_services::executor::{ActionExecutor, OutboxActionExecutor};
use fd_services::store::LocalStore;
use tempfile::TempDir;

/// Account the seeded records belong to.
pub const ACCOUNT: &str = "u1";

/// A second account whose records must never leak into `ACCOUNT`'s view.
pub const OTHER_ACCOUNT: &str = "u2";

/// Create a temporary database with full schema and migrations applied.
/// Returns the Database and the TempDir (must be held alive for the duration of the test).
pub fn create_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let config = DatabaseConfig::default();
    let db = Database::init(&path, &config).expect("failed to init test database");
    (db, dir)
}

pub fn create_test_config_handle() -> ConfigHandle {
    let mut config = AppConfig::default();
    config.account.user_id = ACCOUNT.to_string();
    ConfigHandle::new(config)
}

/// Create an EventBus with a small buffer suitable for tests.
pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

/// Dispatcher over the local store with the outbox executor.
pub fn local_dispatcher(db: &Database, bus: &EventBus) -> AutomationDispatcher {
    local_dispatcher_with(db, bus, Arc::new(OutboxActionExecutor::new(db.clone())))
}

/// Dispatcher over the local store with a custom executor.
pub fn local_dispatcher_with(
    db: &Database,
    bus: &EventBus,
    executor: Arc<dyn ActionExecutor>,
) -> AutomationDispatcher {
    AutomationDispatcher::new(Arc::new(LocalStore::new(db.clone())), executor, bus.clone())
}

/// Seed the database with a small freelance business.
///
/// Account `u1`:
/// - clients `1` Acme (a@acme.com) and `2` Globex (no email)
/// - projects `p1` Website (active, Acme) and `p2` Retainer (planning, no client)
/// - tasks on `p1`: two done, one in progress, one todo
/// - invoices `5` F-5 120 sent (Acme, due 2024-02-01), `6` F-6 300 paid
///   March 2024 (Globex), `7` F-7 80 paid April 2024, `8` F-8 50 draft
/// - contract `c1` Website Redesign (draft, Acme)
/// - automations `a1` client_onboarding, `a2` invoice_followup,
///   `a3` project_update (inactive), `a4` project_update
///
/// Account `u2`: client `9` Initech, one paid invoice, automation `a9`.
pub fn seed_test_data(db: &Database) {
    let conn = db.conn().expect("failed to get connection for seeding");

    conn.execute_batch(
        "INSERT INTO users (id, email, full_name, created_at) VALUES
            ('u1', 'ana@studio.test', 'Ana Studio', '2024-01-01T00:00:00Z'),
            ('u2', 'bo@agency.test', NULL, '2024-01-01T00:00:00Z');

         INSERT INTO clients (id, user_id, name, email, company, created_at) VALUES
            ('1', 'u1', 'Acme', 'a@acme.com', 'Acme Inc', '2024-01-02T00:00:00Z'),
            ('2', 'u1', 'Globex', NULL, NULL, '2024-01-03T00:00:00Z'),
            ('9', 'u2', 'Initech', 'i@initech.com', NULL, '2024-01-04T00:00:00Z');

         INSERT INTO projects (id, user_id, client_id, name, description, status, budget, created_at) VALUES
            ('p1', 'u1', '1', 'Website', 'New marketing site', 'active', 5000, '2024-01-05T00:00:00Z'),
            ('p2', 'u1', NULL, 'Retainer', NULL, 'planning', NULL, '2024-01-06T00:00:00Z');

         INSERT INTO tasks (id, user_id, project_id, title, status, priority, created_at) VALUES
            ('t1', 'u1', 'p1', 'Wireframes', 'done', 'high', '2024-01-07T00:00:00Z'),
            ('t2', 'u1', 'p1', 'Copy', 'in_progress', 'medium', '2024-01-07T00:00:01Z'),
            ('t3', 'u1', 'p1', 'Launch', 'todo', 'high', '2024-01-07T00:00:02Z'),
            ('t4', 'u1', 'p1', 'Kickoff call', 'done', 'low', '2024-01-07T00:00:03Z');

         INSERT INTO invoices (id, user_id, client_id, invoice_number, amount, status, issue_date, due_date, paid_at, created_at) VALUES
            ('5', 'u1', '1', 'F-5', 120, 'sent', '2024-01-10', '2024-02-01', NULL, '2024-01-10T00:00:00Z'),
            ('6', 'u1', '2', 'F-6', 300, 'paid', '2024-02-10', '2024-03-01', '2024-03-10T09:00:00Z', '2024-02-10T00:00:00Z'),
            ('7', 'u1', NULL, 'F-7', 80, 'paid', '2024-03-10', '2024-04-01', '2024-04-02T09:00:00Z', '2024-03-10T00:00:00Z'),
            ('8', 'u1', NULL, 'F-8', 50, 'draft', NULL, NULL, NULL, '2024-03-11T00:00:00Z'),
            ('90', 'u2', '9', 'F-1', 999, 'paid', '2024-03-01', '2024-03-15', '2024-03-05T09:00:00Z', '2024-03-01T00:00:00Z');

         INSERT INTO contracts (id, user_id, client_id, project_id, title, value, status, created_at) VALUES
            ('c1', 'u1', '1', 'p1', 'Website Redesign', 5000, 'draft', '2024-01-05T00:00:00Z');

         INSERT INTO automations (id, user_id, name, trigger_type, is_active, created_at) VALUES
            ('a1', 'u1', 'Welcome', 'client_onboarding', 1, '2024-01-01T00:00:00Z'),
            ('a2', 'u1', 'Chase invoice', 'invoice_followup', 1, '2024-01-01T00:00:00Z'),
            ('a3', 'u1', 'Paused update', 'project_update', 0, '2024-01-01T00:00:00Z'),
            ('a4', 'u1', 'Weekly update', 'project_update', 1, '2024-01-01T00:00:00Z'),
            ('a9', 'u2', 'Their welcome', 'client_onboarding', 1, '2024-01-01T00:00:00Z');",
    )
    .expect("failed to seed test data");
}

/// Insert `count` extra clients for `account`, named `Client 000` upwards.
pub fn seed_many_clients(db: &Database, account: &str, count: usize) {
    let conn = db.conn().expect("failed to get connection for seeding");
    for i in 0..count {
        conn.execute(
            "INSERT INTO clients (id, user_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                format!("{account}-bulk-{i:03}"),
                account,
                format!("Client {i:03}"),
                format!("2024-05-01T00:{:02}:{:02}Z", i / 60, i % 60),
            ],
        )
        .expect("failed to insert client");
    }
}
