//! Automation service.
//!
//! Manages automation records in the local database and runs them through
//! an [`AutomationDispatcher`]. Running always loads the automation through
//! the dispatcher's store, so remote-mode runs see the backend's counters.

use serde::{Deserialize, Serialize};
use tracing::info;

use fd_core::error::{FdError, FdResult};
use fd_models::{Automation, Database, RowMap};

use crate::client::non_empty;
use crate::dispatcher::{AutomationDispatcher, DispatchReport};
use crate::event_bus::{AppEvent, EventBus};
use crate::service::{database_service, ServiceState};
use crate::triggers::TriggerType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationInput {
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    /// Defaults to active.
    #[serde(default)]
    pub inactive: bool,
}

pub struct AutomationService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl AutomationService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    pub fn list(&self, account: &str) -> FdResult<Vec<Automation>> {
        let conn = self.database.conn()?;
        Automation::list_for_user(&conn, account)
    }

    pub fn get(&self, account: &str, id: &str) -> FdResult<Automation> {
        let conn = self.database.conn()?;
        Automation::find_by_id(&conn, account, id)?.ok_or_else(|| FdError::not_found("automation", id))
    }

    pub fn create(&self, account: &str, input: AutomationInput) -> FdResult<Automation> {
        let mut automation = Automation::new(account, &input.name, input.trigger_type.as_str());
        automation.description = non_empty(input.description);
        automation.is_active = !input.inactive;

        let conn = self.database.conn()?;
        automation.insert(&conn)?;

        info!(
            "created automation {} ({}) on {}",
            automation.name, automation.id, automation.trigger_type
        );
        self.event_bus.emit(AppEvent::RecordCreated {
            entity: "automation",
            id: automation.id.clone(),
        });
        Ok(automation)
    }

    /// Flip the active flag and return the new value.
    pub fn toggle(&self, account: &str, id: &str) -> FdResult<bool> {
        let automation = self.get(account, id)?;
        let active = !automation.is_active;

        let conn = self.database.conn()?;
        Automation::set_active(&conn, account, id, active)?;

        info!("automation {} is now {}", automation.name, if active { "active" } else { "inactive" });
        self.event_bus.emit(AppEvent::RecordUpdated {
            entity: "automation",
            id: id.to_string(),
        });
        Ok(active)
    }

    pub fn delete(&self, account: &str, id: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        if !Automation::delete(&conn, account, id)? {
            return Err(FdError::not_found("automation", id));
        }
        self.event_bus.emit(AppEvent::RecordDeleted {
            entity: "automation",
            id: id.to_string(),
        });
        Ok(())
    }

    /// Records the automation could be run against, newest first.
    pub async fn candidates(
        &self,
        dispatcher: &AutomationDispatcher,
        account: &str,
        id: &str,
    ) -> FdResult<Vec<RowMap>> {
        let automation = dispatcher.load(account, id).await?;
        dispatcher.candidates(&automation).await
    }

    /// Run an automation against one record.
    ///
    /// Errors only when the automation itself cannot be loaded; everything
    /// after that is reported through the returned [`DispatchReport`].
    pub async fn run(
        &self,
        dispatcher: &AutomationDispatcher,
        account: &str,
        id: &str,
        target_id: &str,
    ) -> FdResult<DispatchReport> {
        let automation = dispatcher.load(account, id).await?;
        Ok(dispatcher.run(&automation, target_id).await)
    }
}

database_service!(AutomationService, "automations");
