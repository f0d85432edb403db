//! Integration tests for the data layer.
//!
//! Tests database creation, WAL mode, migrations, account-scoped counts,
//! projected reads used by the dispatcher, cascades, transactions and reset.

mod common;

use fd_core::constants::DB_SCHEMA_VERSION;
use fd_core::error::FdError;
use fd_models::migrations;
use fd_models::queries;
use fd_models::{Automation, Client, Invoice, Project, Task};

use common::{ACCOUNT, OTHER_ACCOUNT};

// ---- Database initialization ----

#[test]
fn database_init_creates_file_and_wal_mode() {
    let (db, dir) = common::create_test_db();
    assert!(dir.path().join("test.db").exists(), "database file should exist after init");

    let conn = db.conn().unwrap();
    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_lowercase(), "wal");
}

#[test]
fn database_init_creates_all_tables() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();

    for table in ["users", "clients", "projects", "tasks", "invoices", "contracts", "automations", "outbox"] {
        let exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "table {table} should exist");
    }
}

#[test]
fn migrations_reach_current_version_and_are_idempotent() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    assert_eq!(migrations::get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);

    migrations::run_migrations(&conn).unwrap();
    assert_eq!(migrations::get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);
}

#[test]
fn integrity_check_passes_on_fresh_database() {
    let (db, _dir) = common::create_test_db();
    db.run_integrity_check().unwrap();
}

// ---- Stats ----

#[test]
fn stats_are_scoped_per_account() {
    let (db, _dir) = common::create_test_db();
    common::seed_test_data(&db);

    let mine = db.stats(Some(ACCOUNT)).unwrap();
    assert_eq!(mine.clients, 2);
    assert_eq!(mine.projects, 2);
    assert_eq!(mine.tasks, 4);
    assert_eq!(mine.invoices, 4);
    assert_eq!(mine.contracts, 1);
    assert_eq!(mine.automations, 4);
    assert_eq!(mine.outbox, 0);

    let all = db.stats(None).unwrap();
    assert_eq!(all.clients, 3);
    assert_eq!(all.invoices, 5);
}

// ---- Projected reads ----

#[test]
fn select_projection_returns_only_requested_columns() {
    let (db, _dir) = common::create_test_db();
    common::seed_test_data(&db);
    let conn = db.conn().unwrap();

    let rows = queries::select_projection(
        &conn,
        "invoices",
        &["id", "invoice_number", "amount", "due_date", "client_id"],
        ACCOUNT,
        50,
    )
    .unwrap();

    assert_eq!(rows.len(), 4);
    // Newest first.
    assert_eq!(rows[0]["invoice_number"], "F-8");
    for row in &rows {
        assert_eq!(row.len(), 5);
        assert!(!row.contains_key("user_id"));
        assert!(!row.contains_key("status"));
    }
}

#[test]
fn find_projection_is_scoped_to_account() {
    let (db, _dir) = common::create_test_db();
    common::seed_test_data(&db);
    let conn = db.conn().unwrap();

    let acme = queries::find_projection(&conn, "clients", &["id", "name", "email"], ACCOUNT, "1")
        .unwrap()
        .unwrap();
    assert_eq!(acme["name"], "Acme");

    let foreign = queries::find_projection(&conn, "clients", &["id", "name"], ACCOUNT, "9").unwrap();
    assert!(foreign.is_none());
    let own = queries::find_projection(&conn, "clients", &["id", "name"], OTHER_ACCOUNT, "9").unwrap();
    assert!(own.is_some());
}

#[test]
fn projection_rejects_unknown_tables_and_columns() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();

    let err = queries::select_projection(&conn, "users", &["id"], ACCOUNT, 10).unwrap_err();
    assert!(matches!(err, FdError::Validation(_)));

    let err = queries::select_projection(&conn, "clients", &["id; DROP TABLE clients"], ACCOUNT, 10).unwrap_err();
    assert!(matches!(err, FdError::Validation(_)));
}

// ---- Models ----

#[test]
fn automation_record_execution_counts_up() {
    let (db, _dir) = common::create_test_db();
    common::seed_test_data(&db);
    let conn = db.conn().unwrap();

    assert_eq!(Automation::record_execution(&conn, ACCOUNT, "a1", "2024-06-01T10:00:00Z").unwrap(), 1);
    assert_eq!(Automation::record_execution(&conn, ACCOUNT, "a1", "2024-06-02T10:00:00Z").unwrap(), 2);

    let stored = Automation::find_by_id(&conn, ACCOUNT, "a1").unwrap().unwrap();
    assert_eq!(stored.execution_count, 2);
    assert_eq!(stored.last_executed_at.as_deref(), Some("2024-06-02T10:00:00Z"));

    // Another account's automation is not reachable.
    let err = Automation::record_execution(&conn, ACCOUNT, "a9", "2024-06-02T10:00:00Z").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn deleting_project_cascades_to_tasks() {
    let (db, _dir) = common::create_test_db();
    common::seed_test_data(&db);
    let conn = db.conn().unwrap();

    assert!(Project::delete(&conn, ACCOUNT, "p1").unwrap());
    assert!(Task::list_for_project(&conn, ACCOUNT, "p1").unwrap().is_empty());
    assert!(Task::find_by_id(&conn, ACCOUNT, "t1").unwrap().is_none());
}

#[test]
fn deleting_client_unlinks_invoices() {
    let (db, _dir) = common::create_test_db();
    common::seed_test_data(&db);
    let conn = db.conn().unwrap();

    assert!(Client::delete(&conn, ACCOUNT, "1").unwrap());
    let invoice = Invoice::find_by_id(&conn, ACCOUNT, "5").unwrap().unwrap();
    assert!(invoice.client_id.is_none());
}

#[test]
fn duplicate_invoice_number_is_rejected() {
    let (db, _dir) = common::create_test_db();
    common::seed_test_data(&db);
    let conn = db.conn().unwrap();

    let duplicate = Invoice::new(ACCOUNT, "F-5", 10.0);
    assert!(duplicate.insert(&conn).is_err());

    // The same number is fine for another account.
    let theirs = Invoice::new(OTHER_ACCOUNT, "F-5", 10.0);
    theirs.insert(&conn).unwrap();
}

// ---- Transactions and reset ----

#[test]
fn transaction_rolls_back_on_error() {
    let (db, _dir) = common::create_test_db();
    common::seed_test_data(&db);

    let result: Result<(), FdError> = db.transaction(|conn| {
        Client::new(ACCOUNT, "Temporary").insert(conn)?;
        Err(FdError::Internal("abort".into()))
    });
    assert!(result.is_err());

    let conn = db.conn().unwrap();
    assert_eq!(Client::list_for_user(&conn, ACCOUNT).unwrap().len(), 2);
}

#[test]
fn reset_clears_all_data() {
    let (db, _dir) = common::create_test_db();
    common::seed_test_data(&db);

    db.reset().unwrap();

    let stats = db.stats(None).unwrap();
    assert!(stats.rows().iter().all(|(_, count)| *count == 0));
    let conn = db.conn().unwrap();
    assert_eq!(migrations::get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);
}
