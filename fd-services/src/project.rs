//! Project service.
//!
//! Project CRUD, status changes, and the project detail view with its tasks
//! and completion percentage.

use serde::{Deserialize, Serialize};
use tracing::info;

use fd_core::error::{FdError, FdResult};
use fd_models::{queries, Client, Database, Project, Task};

use crate::client::non_empty;
use crate::event_bus::{AppEvent, EventBus};
use crate::service::{database_service, ServiceState};

/// Fields accepted when creating a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub client_id: Option<String>,
    /// Defaults to `planning`.
    pub status: Option<String>,
    pub budget: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A project with everything its detail page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub client: Option<Client>,
    pub tasks: Vec<Task>,
    pub tasks_done: i64,
    pub tasks_total: i64,
    /// Share of done tasks, 0-100. Zero when the project has no tasks.
    pub progress_percent: u8,
}

/// Whole-number percentage of `done` over `total`.
pub fn progress_percent(done: i64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }
    let pct = (done.clamp(0, total) * 100) / total;
    pct as u8
}

pub struct ProjectService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl ProjectService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    /// Projects of the account, newest first, optionally by status.
    pub fn list(&self, account: &str, status: Option<&str>) -> FdResult<Vec<Project>> {
        let conn = self.database.conn()?;
        Project::list_for_user(&conn, account, status)
    }

    pub fn get(&self, account: &str, id: &str) -> FdResult<Project> {
        let conn = self.database.conn()?;
        Project::find_by_id(&conn, account, id)?.ok_or_else(|| FdError::not_found("project", id))
    }

    pub fn detail(&self, account: &str, id: &str) -> FdResult<ProjectDetail> {
        let conn = self.database.conn()?;
        let project = Project::find_by_id(&conn, account, id)?
            .ok_or_else(|| FdError::not_found("project", id))?;
        let client = match project.client_id.as_deref() {
            Some(client_id) => Client::find_by_id(&conn, account, client_id)?,
            None => None,
        };
        let tasks = Task::list_for_project(&conn, account, id)?;
        let (done, total) = queries::task_progress(&conn, account, id)?;

        Ok(ProjectDetail {
            project,
            client,
            tasks,
            tasks_done: done,
            tasks_total: total,
            progress_percent: progress_percent(done, total),
        })
    }

    pub fn create(&self, account: &str, input: ProjectInput) -> FdResult<Project> {
        let conn = self.database.conn()?;

        let mut project = Project::new(account, &input.name);
        if let Some(client_id) = non_empty(input.client_id) {
            if Client::find_by_id(&conn, account, &client_id)?.is_none() {
                return Err(FdError::not_found("client", &client_id));
            }
            project.client_id = Some(client_id);
        }
        if let Some(status) = input.status {
            project.status = status;
        }
        project.description = non_empty(input.description);
        project.budget = input.budget;
        project.start_date = non_empty(input.start_date);
        project.end_date = non_empty(input.end_date);
        project.insert(&conn)?;

        info!("created project {} ({})", project.name, project.id);
        self.event_bus.emit(AppEvent::RecordCreated {
            entity: "project",
            id: project.id.clone(),
        });
        Ok(project)
    }

    pub fn set_status(&self, account: &str, id: &str, status: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        Project::set_status(&conn, account, id, status)?;
        info!("project {id} is now {status}");
        self.event_bus.emit(AppEvent::RecordUpdated {
            entity: "project",
            id: id.to_string(),
        });
        Ok(())
    }

    /// Delete a project together with its tasks.
    pub fn delete(&self, account: &str, id: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        if !Project::delete(&conn, account, id)? {
            return Err(FdError::not_found("project", id));
        }
        self.event_bus.emit(AppEvent::RecordDeleted {
            entity: "project",
            id: id.to_string(),
        });
        Ok(())
    }
}

database_service!(ProjectService, "projects");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(4, 4), 100);
        assert_eq!(progress_percent(9, 4), 100);
    }
}
