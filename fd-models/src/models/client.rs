//! Client entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use fd_core::error::{FdError, FdResult};

use super::{db_err, new_id, optional, require_text};

/// A customer of the freelancer/agency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: String,
}

impl Client {
    /// A new unsaved client with a fresh id.
    pub fn new(user_id: &str, name: &str) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            email: None,
            company: None,
            phone: None,
            notes: None,
            created_at: fd_core::dates::now_rfc3339(),
        }
    }

    /// Construct a Client from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            company: row.get("company")?,
            phone: row.get("phone")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }

    fn validate(&self) -> FdResult<()> {
        require_text("client name", &self.name)?;
        if let Some(email) = self.email.as_deref() {
            if !email.is_empty() && !email.contains('@') {
                return Err(FdError::Validation(format!("invalid client email \"{email}\"")));
            }
        }
        Ok(())
    }

    // ─── Static finders ──────────────────────────────────────────────────

    /// Find a client of the account by id.
    pub fn find_by_id(conn: &Connection, user_id: &str, id: &str) -> FdResult<Option<Self>> {
        optional(conn.query_row(
            "SELECT * FROM clients WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
            Self::from_row,
        ))
    }

    /// All clients of the account, ordered by name.
    pub fn list_for_user(conn: &Connection, user_id: &str) -> FdResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM clients WHERE user_id = ?1 ORDER BY name COLLATE NOCASE ASC")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([user_id], Self::from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// Substring search over name, email and company.
    pub fn search(conn: &Connection, user_id: &str, query: &str, limit: i64) -> FdResult<Vec<Self>> {
        let pattern = format!("%{}%", query.trim());
        let mut stmt = conn
            .prepare(
                "SELECT * FROM clients
                 WHERE user_id = ?1
                   AND (name LIKE ?2 OR email LIKE ?2 OR company LIKE ?2)
                 ORDER BY name COLLATE NOCASE ASC
                 LIMIT ?3",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![user_id, pattern, limit], Self::from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// Delete a client of the account. Returns whether a row was removed.
    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> FdResult<bool> {
        let changed = conn
            .execute("DELETE FROM clients WHERE id = ?1 AND user_id = ?2", [id, user_id])
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Insert this client.
    pub fn insert(&self, conn: &Connection) -> FdResult<()> {
        self.validate()?;
        conn.execute(
            "INSERT INTO clients (id, user_id, name, email, company, phone, notes, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                self.id,
                self.user_id,
                self.name,
                self.email,
                self.company,
                self.phone,
                self.notes,
                self.created_at,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Write back the editable fields of this client.
    pub fn update(&self, conn: &Connection) -> FdResult<()> {
        self.validate()?;
        let changed = conn
            .execute(
                "UPDATE clients SET name = ?3, email = ?4, company = ?5, phone = ?6, notes = ?7
                 WHERE id = ?1 AND user_id = ?2",
                params![
                    self.id,
                    self.user_id,
                    self.name,
                    self.email,
                    self.company,
                    self.phone,
                    self.notes,
                ],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(FdError::not_found("client", &self.id));
        }
        Ok(())
    }

    /// Label used in tables and pickers: "Name (Company)".
    pub fn label(&self) -> String {
        match self.company.as_deref() {
            Some(company) if !company.is_empty() => format!("{} ({company})", self.name),
            _ => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::conn_with_user;

    fn acme(user_id: &str) -> Client {
        let mut client = Client::new(user_id, "Acme");
        client.email = Some("a@acme.com".into());
        client.company = Some("Acme Corp".into());
        client
    }

    #[test]
    fn test_insert_and_find() {
        let conn = conn_with_user("u1");
        let client = acme("u1");
        client.insert(&conn).unwrap();

        let found = Client::find_by_id(&conn, "u1", &client.id).unwrap().unwrap();
        assert_eq!(found, client);
        assert_eq!(found.label(), "Acme (Acme Corp)");
    }

    #[test]
    fn test_scoped_to_account() {
        let conn = conn_with_user("u1");
        conn.execute(
            "INSERT INTO users (id, email, created_at) VALUES ('u2', 'b@x.io', '2024-01-01')",
            [],
        )
        .unwrap();
        let client = acme("u1");
        client.insert(&conn).unwrap();

        assert!(Client::find_by_id(&conn, "u2", &client.id).unwrap().is_none());
        assert!(Client::list_for_user(&conn, "u2").unwrap().is_empty());
        assert!(!Client::delete(&conn, "u2", &client.id).unwrap());
    }

    #[test]
    fn test_search_matches_email_and_company() {
        let conn = conn_with_user("u1");
        acme("u1").insert(&conn).unwrap();
        Client::new("u1", "Globex").insert(&conn).unwrap();

        assert_eq!(Client::search(&conn, "u1", "acme.com", 10).unwrap().len(), 1);
        assert_eq!(Client::search(&conn, "u1", "corp", 10).unwrap().len(), 1);
        assert_eq!(Client::search(&conn, "u1", "", 10).unwrap().len(), 2);
    }

    #[test]
    fn test_validation() {
        let conn = conn_with_user("u1");
        assert!(Client::new("u1", "  ").insert(&conn).is_err());

        let mut bad = Client::new("u1", "Bad");
        bad.email = Some("not-an-email".into());
        assert!(matches!(bad.insert(&conn), Err(FdError::Validation(_))));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let conn = conn_with_user("u1");
        let err = acme("u1").update(&conn).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_deserialize_backend_row() {
        let json = serde_json::json!({
            "id": "c-1",
            "user_id": "u1",
            "name": "Acme",
            "email": "a@acme.com",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let client: Client = serde_json::from_value(json).unwrap();
        assert_eq!(client.email.as_deref(), Some("a@acme.com"));
        assert!(client.company.is_none());
    }
}
