//! Client service.
//!
//! CRUD and search over the account's clients in the local database.

use serde::{Deserialize, Serialize};
use tracing::info;

use fd_core::error::{FdError, FdResult};
use fd_models::{Client, Database, Project};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{database_service, ServiceState};

/// Editable client fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Service for the account's clients.
pub struct ClientService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl ClientService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    /// All clients of the account, ordered by name.
    pub fn list(&self, account: &str) -> FdResult<Vec<Client>> {
        let conn = self.database.conn()?;
        Client::list_for_user(&conn, account)
    }

    pub fn get(&self, account: &str, id: &str) -> FdResult<Client> {
        let conn = self.database.conn()?;
        Client::find_by_id(&conn, account, id)?.ok_or_else(|| FdError::not_found("client", id))
    }

    /// Substring search over name, email and company.
    pub fn search(&self, account: &str, query: &str, limit: i64) -> FdResult<Vec<Client>> {
        let conn = self.database.conn()?;
        Client::search(&conn, account, query, limit)
    }

    /// Projects belonging to a client.
    pub fn projects(&self, account: &str, client_id: &str) -> FdResult<Vec<Project>> {
        let conn = self.database.conn()?;
        Project::list_for_client(&conn, account, client_id)
    }

    pub fn create(&self, account: &str, input: ClientInput) -> FdResult<Client> {
        let mut client = Client::new(account, &input.name);
        apply(&mut client, input);

        let conn = self.database.conn()?;
        client.insert(&conn)?;

        info!("created client {} ({})", client.name, client.id);
        self.event_bus.emit(AppEvent::RecordCreated {
            entity: "client",
            id: client.id.clone(),
        });
        Ok(client)
    }

    /// Replace the editable fields of a client.
    pub fn update(&self, account: &str, id: &str, input: ClientInput) -> FdResult<Client> {
        let mut client = self.get(account, id)?;
        client.name = input.name.trim().to_string();
        apply(&mut client, input);

        let conn = self.database.conn()?;
        client.update(&conn)?;

        self.event_bus.emit(AppEvent::RecordUpdated {
            entity: "client",
            id: client.id.clone(),
        });
        Ok(client)
    }

    /// Delete a client. Projects, invoices and contracts keep existing
    /// with their client link cleared.
    pub fn delete(&self, account: &str, id: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        if !Client::delete(&conn, account, id)? {
            return Err(FdError::not_found("client", id));
        }
        info!("deleted client {id}");
        self.event_bus.emit(AppEvent::RecordDeleted {
            entity: "client",
            id: id.to_string(),
        });
        Ok(())
    }
}

fn apply(client: &mut Client, input: ClientInput) {
    client.email = non_empty(input.email);
    client.company = non_empty(input.company);
    client.phone = non_empty(input.phone);
    client.notes = non_empty(input.notes);
}

/// Treat blank optional text as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

database_service!(ClientService, "clients");
