//! Account (user) entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use fd_core::error::FdResult;

use super::{db_err, optional, require_text};

/// The account every other record belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub created_at: String,
}

impl User {
    /// A new account with a given id (ids come from the auth provider).
    pub fn new(id: &str, email: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            full_name: None,
            company: None,
            created_at: fd_core::dates::now_rfc3339(),
        }
    }

    /// Construct a User from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            full_name: row.get("full_name")?,
            company: row.get("company")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Find an account by id.
    pub fn find_by_id(conn: &Connection, id: &str) -> FdResult<Option<Self>> {
        optional(conn.query_row("SELECT * FROM users WHERE id = ?1", [id], Self::from_row))
    }

    /// Insert the account, or refresh its profile fields if it already exists.
    pub fn upsert(&self, conn: &Connection) -> FdResult<()> {
        require_text("email", &self.email)?;
        conn.execute(
            "INSERT INTO users (id, email, full_name, company, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                full_name = COALESCE(excluded.full_name, full_name),
                company = COALESCE(excluded.company, company)",
            params![self.id, self.email, self.full_name, self.company, self.created_at],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Name shown in greetings and documents.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}
