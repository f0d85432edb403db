//! Task entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use fd_core::constants::{check_status, task_priority, task_status};
use fd_core::error::{FdError, FdResult};

use super::{db_err, new_id, optional, require_text};

/// A to-do item inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub created_at: String,
}

impl Task {
    /// A new unsaved `todo` task with medium priority.
    pub fn new(user_id: &str, project_id: &str, title: &str) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            title: title.trim().to_string(),
            description: None,
            status: task_status::TODO.to_string(),
            priority: task_priority::MEDIUM.to_string(),
            due_date: None,
            created_at: fd_core::dates::now_rfc3339(),
        }
    }

    /// Construct a Task from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            project_id: row.get("project_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            due_date: row.get("due_date")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Whether the task is finished.
    pub fn is_done(&self) -> bool {
        self.status == task_status::DONE
    }

    fn query(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> FdResult<Vec<Self>> {
        let mut stmt = conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(args, Self::from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// Find a task of the account by id.
    pub fn find_by_id(conn: &Connection, user_id: &str, id: &str) -> FdResult<Option<Self>> {
        optional(conn.query_row(
            "SELECT * FROM tasks WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
            Self::from_row,
        ))
    }

    /// Tasks of a project: open first, then by due date.
    pub fn list_for_project(conn: &Connection, user_id: &str, project_id: &str) -> FdResult<Vec<Self>> {
        Self::query(
            conn,
            "SELECT * FROM tasks WHERE user_id = ?1 AND project_id = ?2
             ORDER BY status = 'done' ASC, due_date IS NULL ASC, due_date ASC, created_at ASC",
            [user_id, project_id],
        )
    }

    /// Tasks across all projects of the account, optionally by status.
    pub fn list_for_user(conn: &Connection, user_id: &str, status: Option<&str>) -> FdResult<Vec<Self>> {
        Self::query(
            conn,
            "SELECT * FROM tasks WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY due_date IS NULL ASC, due_date ASC, created_at ASC",
            params![user_id, status],
        )
    }

    /// Insert this task.
    pub fn insert(&self, conn: &Connection) -> FdResult<()> {
        require_text("task title", &self.title)?;
        check_status("task status", &self.status, task_status::ALL)?;
        check_status("task priority", &self.priority, task_priority::ALL)?;
        if let Some(due) = self.due_date.as_deref() {
            fd_core::dates::parse_date(due)?;
        }
        conn.execute(
            "INSERT INTO tasks (
                id, user_id, project_id, title, description, status, priority, due_date, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                self.id,
                self.user_id,
                self.project_id,
                self.title,
                self.description,
                self.status,
                self.priority,
                self.due_date,
                self.created_at,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Change the status of a task of the account.
    pub fn set_status(conn: &Connection, user_id: &str, id: &str, status: &str) -> FdResult<()> {
        check_status("task status", status, task_status::ALL)?;
        let changed = conn
            .execute(
                "UPDATE tasks SET status = ?3 WHERE id = ?1 AND user_id = ?2",
                [id, user_id, status],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(FdError::not_found("task", id));
        }
        Ok(())
    }

    /// Delete a task of the account.
    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> FdResult<bool> {
        let changed = conn
            .execute("DELETE FROM tasks WHERE id = ?1 AND user_id = ?2", [id, user_id])
            .map_err(db_err)?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::Project;
    use crate::models::test_support::conn_with_user;

    fn project(conn: &Connection) -> Project {
        let project = Project::new("u1", "Website");
        project.insert(conn).unwrap();
        project
    }

    #[test]
    fn test_open_tasks_sort_first() {
        let conn = conn_with_user("u1");
        let p = project(&conn);

        let mut done = Task::new("u1", &p.id, "Kickoff");
        done.status = task_status::DONE.into();
        done.insert(&conn).unwrap();

        let mut later = Task::new("u1", &p.id, "Launch");
        later.due_date = Some("2024-09-01".into());
        later.insert(&conn).unwrap();

        let mut sooner = Task::new("u1", &p.id, "Wireframes");
        sooner.due_date = Some("2024-06-01".into());
        sooner.insert(&conn).unwrap();

        let titles: Vec<String> = Task::list_for_project(&conn, "u1", &p.id)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["Wireframes", "Launch", "Kickoff"]);
    }

    #[test]
    fn test_status_filter_and_update() {
        let conn = conn_with_user("u1");
        let p = project(&conn);
        let task = Task::new("u1", &p.id, "Copy");
        task.insert(&conn).unwrap();

        Task::set_status(&conn, "u1", &task.id, "in_progress").unwrap();
        assert_eq!(Task::list_for_user(&conn, "u1", Some("in_progress")).unwrap().len(), 1);
        assert!(Task::list_for_user(&conn, "u1", Some("todo")).unwrap().is_empty());
        assert!(Task::set_status(&conn, "u1", &task.id, "blocked").is_err());
    }

    #[test]
    fn test_cascade_on_project_delete() {
        let conn = conn_with_user("u1");
        let p = project(&conn);
        Task::new("u1", &p.id, "Copy").insert(&conn).unwrap();

        assert!(Project::delete(&conn, "u1", &p.id).unwrap());
        assert!(Task::list_for_user(&conn, "u1", None).unwrap().is_empty());
    }

    #[test]
    fn test_bad_priority() {
        let conn = conn_with_user("u1");
        let p = project(&conn);
        let mut task = Task::new("u1", &p.id, "Copy");
        task.priority = "urgent".into();
        assert!(task.insert(&conn).is_err());
    }
}
