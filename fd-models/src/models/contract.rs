//! Contract entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use fd_core::constants::{check_status, contract_status};
use fd_core::error::{FdError, FdResult};

use super::{db_err, new_id, optional, require_text};

/// An agreement with a client, optionally tied to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    pub status: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub created_at: String,
}

impl Contract {
    pub fn new(user_id: &str, title: &str) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            client_id: None,
            project_id: None,
            title: title.trim().to_string(),
            content: None,
            value: None,
            status: contract_status::DRAFT.to_string(),
            start_date: None,
            end_date: None,
            created_at: fd_core::dates::now_rfc3339(),
        }
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            client_id: row.get("client_id")?,
            project_id: row.get("project_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            value: row.get("value")?,
            status: row.get("status")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            created_at: row.get("created_at")?,
        })
    }

    fn validate(&self) -> FdResult<()> {
        require_text("contract title", &self.title)?;
        check_status("contract status", &self.status, contract_status::ALL)?;
        if matches!(self.value, Some(v) if v < 0.0) {
            return Err(FdError::Validation("contract value must not be negative".into()));
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, user_id: &str, id: &str) -> FdResult<Option<Self>> {
        optional(conn.query_row(
            "SELECT * FROM contracts WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
            Self::from_row,
        ))
    }

    /// Contracts of the account, newest first.
    pub fn list_for_user(conn: &Connection, user_id: &str) -> FdResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM contracts WHERE user_id = ?1 ORDER BY created_at DESC")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([user_id], Self::from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    pub fn insert(&self, conn: &Connection) -> FdResult<()> {
        self.validate()?;
        conn.execute(
            "INSERT INTO contracts (
                id, user_id, client_id, project_id, title, content, value,
                status, start_date, end_date, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
            params![
                self.id,
                self.user_id,
                self.client_id,
                self.project_id,
                self.title,
                self.content,
                self.value,
                self.status,
                self.start_date,
                self.end_date,
                self.created_at,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Write back the editable fields of this contract.
    pub fn update(&self, conn: &Connection) -> FdResult<()> {
        self.validate()?;
        let changed = conn
            .execute(
                "UPDATE contracts SET client_id = ?3, project_id = ?4, title = ?5, content = ?6,
                    value = ?7, status = ?8, start_date = ?9, end_date = ?10
                 WHERE id = ?1 AND user_id = ?2",
                params![
                    self.id,
                    self.user_id,
                    self.client_id,
                    self.project_id,
                    self.title,
                    self.content,
                    self.value,
                    self.status,
                    self.start_date,
                    self.end_date,
                ],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(FdError::not_found("contract", &self.id));
        }
        Ok(())
    }

    pub fn set_status(conn: &Connection, user_id: &str, id: &str, status: &str) -> FdResult<()> {
        check_status("contract status", status, contract_status::ALL)?;
        let changed = conn
            .execute(
                "UPDATE contracts SET status = ?3 WHERE id = ?1 AND user_id = ?2",
                [id, user_id, status],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(FdError::not_found("contract", id));
        }
        Ok(())
    }

    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> FdResult<bool> {
        let changed = conn
            .execute("DELETE FROM contracts WHERE id = ?1 AND user_id = ?2", [id, user_id])
            .map_err(db_err)?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::Client;
    use crate::models::test_support::conn_with_user;

    #[test]
    fn test_crud() {
        let conn = conn_with_user("u1");
        let mut contract = Contract::new("u1", "Website build");
        contract.value = Some(2500.0);
        contract.insert(&conn).unwrap();

        contract.content = Some("Scope: five pages".into());
        contract.update(&conn).unwrap();
        Contract::set_status(&conn, "u1", &contract.id, "signed").unwrap();

        let stored = Contract::find_by_id(&conn, "u1", &contract.id).unwrap().unwrap();
        assert_eq!(stored.status, "signed");
        assert_eq!(stored.content.as_deref(), Some("Scope: five pages"));

        assert!(Contract::delete(&conn, "u1", &contract.id).unwrap());
        assert!(Contract::list_for_user(&conn, "u1").unwrap().is_empty());
    }

    #[test]
    fn test_client_delete_detaches() {
        let conn = conn_with_user("u1");
        let client = Client::new("u1", "Acme");
        client.insert(&conn).unwrap();
        let mut contract = Contract::new("u1", "Retainer");
        contract.client_id = Some(client.id.clone());
        contract.insert(&conn).unwrap();

        Client::delete(&conn, "u1", &client.id).unwrap();
        let stored = Contract::find_by_id(&conn, "u1", &contract.id).unwrap().unwrap();
        assert!(stored.client_id.is_none());
    }

    #[test]
    fn test_status_validated() {
        let conn = conn_with_user("u1");
        let mut contract = Contract::new("u1", "Retainer");
        contract.status = "approved".into();
        assert!(contract.insert(&conn).is_err());
    }
}
