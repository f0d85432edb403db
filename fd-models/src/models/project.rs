//! Project entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use fd_core::constants::{check_status, project_status};
use fd_core::error::{FdError, FdResult};

use super::{db_err, new_id, optional, require_text};

/// A piece of work delivered for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub created_at: String,
}

impl Project {
    /// A new unsaved project in the `planning` state.
    pub fn new(user_id: &str, name: &str) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            client_id: None,
            name: name.trim().to_string(),
            description: None,
            status: project_status::PLANNING.to_string(),
            budget: None,
            start_date: None,
            end_date: None,
            created_at: fd_core::dates::now_rfc3339(),
        }
    }

    /// Construct a Project from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            client_id: row.get("client_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            status: row.get("status")?,
            budget: row.get("budget")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            created_at: row.get("created_at")?,
        })
    }

    fn validate(&self) -> FdResult<()> {
        require_text("project name", &self.name)?;
        check_status("project status", &self.status, project_status::ALL)?;
        if let Some(budget) = self.budget {
            if budget < 0.0 {
                return Err(FdError::Validation("project budget must not be negative".into()));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date.as_deref(), self.end_date.as_deref()) {
            if fd_core::dates::parse_date(end)? < fd_core::dates::parse_date(start)? {
                return Err(FdError::Validation("project ends before it starts".into()));
            }
        }
        Ok(())
    }

    /// Whether work on the project is ongoing.
    pub fn is_active(&self) -> bool {
        self.status == project_status::ACTIVE
    }

    /// Find a project of the account by id.
    pub fn find_by_id(conn: &Connection, user_id: &str, id: &str) -> FdResult<Option<Self>> {
        optional(conn.query_row(
            "SELECT * FROM projects WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
            Self::from_row,
        ))
    }

    /// Projects of the account, newest first, optionally filtered by status.
    pub fn list_for_user(conn: &Connection, user_id: &str, status: Option<&str>) -> FdResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM projects
                 WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
                 ORDER BY created_at DESC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![user_id, status], Self::from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// Projects of the account belonging to one client.
    pub fn list_for_client(conn: &Connection, user_id: &str, client_id: &str) -> FdResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM projects WHERE user_id = ?1 AND client_id = ?2 ORDER BY name")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([user_id, client_id], Self::from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// Insert this project.
    pub fn insert(&self, conn: &Connection) -> FdResult<()> {
        self.validate()?;
        conn.execute(
            "INSERT INTO projects (
                id, user_id, client_id, name, description, status,
                budget, start_date, end_date, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                self.id,
                self.user_id,
                self.client_id,
                self.name,
                self.description,
                self.status,
                self.budget,
                self.start_date,
                self.end_date,
                self.created_at,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Change the status of a project of the account.
    pub fn set_status(conn: &Connection, user_id: &str, id: &str, status: &str) -> FdResult<()> {
        check_status("project status", status, project_status::ALL)?;
        let changed = conn
            .execute(
                "UPDATE projects SET status = ?3 WHERE id = ?1 AND user_id = ?2",
                [id, user_id, status],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(FdError::not_found("project", id));
        }
        Ok(())
    }

    /// Delete a project (and its tasks, via cascade).
    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> FdResult<bool> {
        let changed = conn
            .execute("DELETE FROM projects WHERE id = ?1 AND user_id = ?2", [id, user_id])
            .map_err(db_err)?;
        Ok(changed > 0)
    }
}
