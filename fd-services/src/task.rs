//! Task service.

use serde::{Deserialize, Serialize};
use tracing::debug;

use fd_core::error::{FdError, FdResult};
use fd_models::{Database, Project, Task};

use crate::client::non_empty;
use crate::event_bus::{AppEvent, EventBus};
use crate::service::{database_service, ServiceState};

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInput {
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `medium`.
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

pub struct TaskService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl TaskService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    pub fn list_for_project(&self, account: &str, project_id: &str) -> FdResult<Vec<Task>> {
        let conn = self.database.conn()?;
        Task::list_for_project(&conn, account, project_id)
    }

    /// Tasks across all projects, optionally filtered by status.
    pub fn list(&self, account: &str, status: Option<&str>) -> FdResult<Vec<Task>> {
        let conn = self.database.conn()?;
        Task::list_for_user(&conn, account, status)
    }

    pub fn create(&self, account: &str, input: TaskInput) -> FdResult<Task> {
        let conn = self.database.conn()?;
        if Project::find_by_id(&conn, account, &input.project_id)?.is_none() {
            return Err(FdError::not_found("project", &input.project_id));
        }

        let mut task = Task::new(account, &input.project_id, &input.title);
        task.description = non_empty(input.description);
        if let Some(priority) = input.priority {
            task.priority = priority;
        }
        task.due_date = non_empty(input.due_date);
        task.insert(&conn)?;

        debug!("created task {} in project {}", task.id, task.project_id);
        self.event_bus.emit(AppEvent::RecordCreated {
            entity: "task",
            id: task.id.clone(),
        });
        Ok(task)
    }

    pub fn set_status(&self, account: &str, id: &str, status: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        Task::set_status(&conn, account, id, status)?;
        self.event_bus.emit(AppEvent::RecordUpdated {
            entity: "task",
            id: id.to_string(),
        });
        Ok(())
    }

    pub fn delete(&self, account: &str, id: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        if !Task::delete(&conn, account, id)? {
            return Err(FdError::not_found("task", id));
        }
        self.event_bus.emit(AppEvent::RecordDeleted {
            entity: "task",
            id: id.to_string(),
        });
        Ok(())
    }
}

database_service!(TaskService, "tasks");
