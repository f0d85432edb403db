//! The local SQLite database.
//!
//! One file, opened through an r2d2 pool whose connections all get the same
//! pragmas (WAL, foreign keys, busy timeout). Opening creates the base schema
//! and applies pending migrations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, error, info, warn};

use fd_core::config::DatabaseConfig;
use fd_core::error::{FdError, FdResult};

use crate::migrations;
use crate::models::db_err;
use crate::schema;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled connection handed out by [`Database::conn`].
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// Cheaply cloneable handle to the pool; services each hold one.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database file at `db_path`.
    pub fn init(db_path: &Path, config: &DatabaseConfig) -> FdResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(path = %db_path.display(), "opening database");

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(Pragmas { wal: config.wal_mode }))
            .build(manager)
            .map_err(|e| FdError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
            path: db_path.to_path_buf(),
        };

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
            migrations::run_migrations(&conn)?;
        }

        debug!("database ready");
        Ok(db)
    }

    pub fn conn(&self) -> FdResult<DbConn> {
        self.pool.get().map_err(|e| FdError::Pool(e.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `PRAGMA integrity_check`; anything but `ok` is an error.
    pub fn run_integrity_check(&self) -> FdResult<()> {
        let verdict: String = self
            .conn()?
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(db_err)?;
        if verdict != "ok" {
            error!("integrity check failed: {verdict}");
            return Err(FdError::IntegrityCheck(verdict));
        }
        Ok(())
    }

    /// Run `f` inside a transaction, committing only when it returns `Ok`.
    pub fn transaction<T, F>(&self, f: F) -> FdResult<T>
    where
        F: FnOnce(&Connection) -> FdResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        let value = f(&tx)?;
        tx.commit().map_err(db_err)?;
        Ok(value)
    }

    /// Row counts per table, optionally restricted to one account.
    pub fn stats(&self, user_id: Option<&str>) -> FdResult<DatabaseStats> {
        let conn = self.conn()?;
        let mut counts = [0i64; STATS_TABLES.len()];
        for (slot, table) in counts.iter_mut().zip(STATS_TABLES) {
            *slot = match user_id {
                Some(uid) => conn.query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE user_id = ?1"),
                    [uid],
                    |row| row.get(0),
                ),
                None => conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0)),
            }
            .map_err(db_err)?;
        }

        let [clients, projects, tasks, invoices, contracts, automations, outbox] = counts;
        Ok(DatabaseStats { clients, projects, tasks, invoices, contracts, automations, outbox })
    }

    /// Drop every table and recreate an empty, fully migrated schema.
    pub fn reset(&self) -> FdResult<()> {
        warn!(path = %self.path.display(), "resetting database, all rows will be deleted");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        schema::create_tables(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(())
    }
}

/// Tables counted by [`Database::stats`], in display order.
const STATS_TABLES: [&str; 7] = ["clients", "projects", "tasks", "invoices", "contracts", "automations", "outbox"];

/// Row counts per table.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DatabaseStats {
    pub clients: i64,
    pub projects: i64,
    pub tasks: i64,
    pub invoices: i64,
    pub contracts: i64,
    pub automations: i64,
    pub outbox: i64,
}

impl DatabaseStats {
    /// `(table, count)` pairs in display order.
    pub fn rows(&self) -> [(&'static str, i64); 7] {
        let counts = [
            self.clients,
            self.projects,
            self.tasks,
            self.invoices,
            self.contracts,
            self.automations,
            self.outbox,
        ];
        std::array::from_fn(|i| (STATS_TABLES[i], counts[i]))
    }
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .rows()
            .iter()
            .map(|(name, count)| format!("{name}={count}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Pragmas applied to every pooled connection.
#[derive(Debug)]
struct Pragmas {
    wal: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for Pragmas {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;",
        )?;

        Ok(())
    }
}
