//! Outbox of dispatched actions.
//!
//! When no backend is configured, actions are recorded here instead of being
//! sent. Each entry is the action name plus the exact payload that would have
//! been posted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use rusqlite::{params, Connection, Row};
use fd_core::error::{FdError, FdResult};

use super::db_err;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: i64,
    pub user_id: String,
    pub action: String,
    pub payload: Value,
    pub created_at: String,
}

impl OutboxEntry {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw: String = row.get("payload")?;
        let payload = serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            action: row.get("action")?,
            payload,
            created_at: row.get("created_at")?,
        })
    }

    /// Append an action to the outbox and return its row id.
    pub fn insert(conn: &Connection, user_id: &str, action: &str, payload: &Value, at: &str) -> FdResult<i64> {
        let body = serde_json::to_string(payload)
            .map_err(|e| FdError::Serialization(e.to_string()))?;
        conn.execute(
            "INSERT INTO outbox (user_id, action, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, action, body, at],
        )
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent outbox entries of the account.
    pub fn list_for_user(conn: &Connection, user_id: &str, limit: i64) -> FdResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM outbox WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![user_id, limit], Self::from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::conn_with_user;
    use serde_json::json;

    #[test]
    fn test_insert_and_list() {
        let conn = conn_with_user("u1");
        let first = OutboxEntry::insert(&conn, "u1", "send_welcome_email", &json!({"clientName": "Acme"}), "t1").unwrap();
        let second = OutboxEntry::insert(&conn, "u1", "send_payment_reminder", &json!({"invoiceAmount": 120}), "t2").unwrap();
        assert!(second > first);

        let entries = OutboxEntry::list_for_user(&conn, "u1", 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "send_payment_reminder");
        assert_eq!(entries[1].payload["clientName"], "Acme");
    }
}
