//! Automation entity model.
//!
//! An automation names a trigger type; the trigger decides which table its
//! targets come from and which action is sent. `execution_count` and
//! `last_executed_at` are bookkeeping written only after a successful run.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use fd_core::error::{FdError, FdResult};

use super::{db_err, new_id, optional, require_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub trigger_type: String,
    pub is_active: bool,
    #[serde(default)]
    pub execution_count: i64,
    #[serde(default)]
    pub last_executed_at: Option<String>,
    pub created_at: String,
}

impl Automation {
    /// A new, active automation that has never run.
    pub fn new(user_id: &str, name: &str, trigger_type: &str) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            description: None,
            trigger_type: trigger_type.to_string(),
            is_active: true,
            execution_count: 0,
            last_executed_at: None,
            created_at: fd_core::dates::now_rfc3339(),
        }
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            trigger_type: row.get("trigger_type")?,
            is_active: row.get::<_, i64>("is_active")? != 0,
            execution_count: row.get("execution_count")?,
            last_executed_at: row.get("last_executed_at")?,
            created_at: row.get("created_at")?,
        })
    }

    // ─── Static finders ──────────────────────────────────────────────────

    pub fn find_by_id(conn: &Connection, user_id: &str, id: &str) -> FdResult<Option<Self>> {
        optional(conn.query_row(
            "SELECT * FROM automations WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
            Self::from_row,
        ))
    }

    /// Automations of the account, active ones first.
    pub fn list_for_user(conn: &Connection, user_id: &str) -> FdResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM automations WHERE user_id = ?1
                 ORDER BY is_active DESC, name COLLATE NOCASE ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([user_id], Self::from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn insert(&self, conn: &Connection) -> FdResult<()> {
        require_text("automation name", &self.name)?;
        require_text("trigger type", &self.trigger_type)?;
        conn.execute(
            "INSERT INTO automations (
                id, user_id, name, description, trigger_type, is_active,
                execution_count, last_executed_at, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                self.id,
                self.user_id,
                self.name,
                self.description,
                self.trigger_type,
                self.is_active as i64,
                self.execution_count,
                self.last_executed_at,
                self.created_at,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Enable or disable an automation of the account.
    pub fn set_active(conn: &Connection, user_id: &str, id: &str, active: bool) -> FdResult<()> {
        let changed = conn
            .execute(
                "UPDATE automations SET is_active = ?3 WHERE id = ?1 AND user_id = ?2",
                params![id, user_id, active as i64],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(FdError::not_found("automation", id));
        }
        Ok(())
    }

    /// Count one successful run at `at`. The increment happens in a single
    /// statement; the new count is returned.
    pub fn record_execution(conn: &Connection, user_id: &str, id: &str, at: &str) -> FdResult<i64> {
        optional(conn.query_row(
            "UPDATE automations
             SET execution_count = execution_count + 1, last_executed_at = ?3
             WHERE id = ?1 AND user_id = ?2
             RETURNING execution_count",
            [id, user_id, at],
            |row| row.get(0),
        ))?
        .ok_or_else(|| FdError::not_found("automation", id))
    }

    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> FdResult<bool> {
        let changed = conn
            .execute("DELETE FROM automations WHERE id = ?1 AND user_id = ?2", [id, user_id])
            .map_err(db_err)?;
        Ok(changed > 0)
    }
}
