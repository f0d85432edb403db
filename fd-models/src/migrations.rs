//! Versioned schema migrations.
//!
//! Version 1 is the base schema from [`schema::create_tables`](crate::schema::create_tables).
//! Later versions are listed in [`MIGRATIONS`] and applied in order, each
//! one followed by a bump of the stored version.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};
use fd_core::constants::DB_SCHEMA_VERSION;
use fd_core::error::{FdError, FdResult};

/// A schema change on top of the base schema.
struct Migration {
    version: i32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 2,
    name: "outbox",
    sql: "CREATE TABLE IF NOT EXISTS outbox (
              id          INTEGER PRIMARY KEY AUTOINCREMENT,
              user_id     TEXT NOT NULL,
              action      TEXT NOT NULL,
              payload     TEXT NOT NULL,
              created_at  TEXT NOT NULL
          );
          CREATE INDEX IF NOT EXISTS idx_outbox_user ON outbox(user_id, created_at);",
}];

fn migration_err(e: rusqlite::Error) -> FdError {
    FdError::Migration(e.to_string())
}

/// Bring the schema up to [`DB_SCHEMA_VERSION`].
pub fn run_migrations(conn: &Connection) -> FdResult<()> {
    let from = get_schema_version(conn)?;
    if from >= DB_SCHEMA_VERSION {
        debug!("schema at version {from}, nothing to migrate");
        return Ok(());
    }

    // Fresh databases start at 0 and already have the base schema.
    if from < 1 {
        set_schema_version(conn, 1)?;
    }
    for migration in MIGRATIONS.iter().filter(|m| m.version > from) {
        info!(version = migration.version, name = migration.name, "applying migration");
        conn.execute_batch(migration.sql)
            .map_err(|e| FdError::Migration(format!("v{} {}: {e}", migration.version, migration.name)))?;
        set_schema_version(conn, migration.version)?;
    }

    info!("schema migrated from version {from} to {DB_SCHEMA_VERSION}");
    Ok(())
}

/// Stored schema version; 0 for a database that has never been migrated.
pub fn get_schema_version(conn: &Connection) -> FdResult<i32> {
    let stored: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(migration_err)?;
    Ok(stored.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> FdResult<()> {
    let updated = conn
        .execute("UPDATE schema_version SET version = ?1", [version])
        .map_err(migration_err)?;
    if updated == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
            .map_err(migration_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_fresh_database_reaches_latest_version() {
        let conn = fresh();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);
    }

    #[test]
    fn test_rerun_is_a_no_op() {
        let conn = fresh();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);
    }

    #[test]
    fn test_outbox_table_created() {
        let conn = fresh();
        run_migrations(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM outbox", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_migrations_are_ordered_and_end_at_latest() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.last().copied(), Some(DB_SCHEMA_VERSION));
    }
}
