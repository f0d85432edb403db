//! Contract service.
//!
//! Besides CRUD this names the generated contract document and hands a
//! contract to the outbound mail action.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use fd_core::constants::{contract_status, CONTRACT_DOCUMENT_PREFIX};
use fd_core::error::{FdError, FdResult};
use fd_models::{Client, Contract, Database};

use crate::client::non_empty;
use crate::event_bus::{AppEvent, EventBus};
use crate::executor::ActionExecutor;
use crate::service::{database_service, ServiceState};

/// Action invoked by [`ContractService::send`].
pub const SEND_CONTRACT_ACTION: &str = "send_contract_email";

lazy_static! {
    // Letters of any script are kept, so "Diseño" stays "diseño".
    static ref NON_ALNUM: Regex = Regex::new(r"[^\p{L}\p{M}\p{N}]+").unwrap();
}

/// File name of a contract's PDF: `contrato-<slug>-<first 8 of id>.pdf`.
pub fn document_filename(contract: &Contract) -> String {
    let lowered = contract.title.to_lowercase();
    let slug = NON_ALNUM.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    let short_id: String = contract.id.chars().take(8).collect();
    format!("{CONTRACT_DOCUMENT_PREFIX}-{slug}-{short_id}.pdf")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractInput {
    pub title: String,
    pub content: Option<String>,
    pub value: Option<f64>,
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub struct ContractService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl ContractService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    pub fn list(&self, account: &str) -> FdResult<Vec<Contract>> {
        let conn = self.database.conn()?;
        Contract::list_for_user(&conn, account)
    }

    pub fn get(&self, account: &str, id: &str) -> FdResult<Contract> {
        let conn = self.database.conn()?;
        Contract::find_by_id(&conn, account, id)?.ok_or_else(|| FdError::not_found("contract", id))
    }

    pub fn create(&self, account: &str, input: ContractInput) -> FdResult<Contract> {
        let conn = self.database.conn()?;

        let mut contract = Contract::new(account, &input.title);
        if let Some(client_id) = non_empty(input.client_id) {
            if Client::find_by_id(&conn, account, &client_id)?.is_none() {
                return Err(FdError::not_found("client", &client_id));
            }
            contract.client_id = Some(client_id);
        }
        contract.project_id = non_empty(input.project_id);
        contract.content = non_empty(input.content);
        contract.value = input.value;
        contract.start_date = non_empty(input.start_date);
        contract.end_date = non_empty(input.end_date);
        contract.insert(&conn)?;

        info!("created contract {} ({})", contract.title, contract.id);
        self.event_bus.emit(AppEvent::RecordCreated {
            entity: "contract",
            id: contract.id.clone(),
        });
        Ok(contract)
    }

    pub fn set_status(&self, account: &str, id: &str, status: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        Contract::set_status(&conn, account, id, status)?;
        self.event_bus.emit(AppEvent::RecordUpdated {
            entity: "contract",
            id: id.to_string(),
        });
        Ok(())
    }

    pub fn delete(&self, account: &str, id: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        if !Contract::delete(&conn, account, id)? {
            return Err(FdError::not_found("contract", id));
        }
        self.event_bus.emit(AppEvent::RecordDeleted {
            entity: "contract",
            id: id.to_string(),
        });
        Ok(())
    }

    /// Payload handed to the mail action for `contract`.
    pub fn send_payload(&self, account: &str, contract: &Contract) -> FdResult<Value> {
        let client = match contract.client_id.as_deref() {
            Some(client_id) => {
                let conn = self.database.conn()?;
                Client::find_by_id(&conn, account, client_id)?
            }
            None => None,
        };
        Ok(json!({
            "contractId": contract.id,
            "contractTitle": contract.title,
            "contractValue": contract.value,
            "clientName": client.as_ref().map(|c| c.name.clone()),
            "clientEmail": client.as_ref().and_then(|c| c.email.clone()),
            "documentName": document_filename(contract),
        }))
    }

    /// Email a contract to its client through `executor`.
    ///
    /// A draft moves to `sent` once the action succeeded. A failed action
    /// leaves the contract untouched.
    pub async fn send(&self, executor: &dyn ActionExecutor, account: &str, id: &str) -> FdResult<Value> {
        let contract = self.get(account, id)?;
        let payload = self.send_payload(account, &contract)?;
        if payload["clientEmail"].is_null() {
            warn!(contract_id = id, "sending contract without a client email");
        }

        let reply = executor.execute(SEND_CONTRACT_ACTION, &payload, account).await?;

        if contract.status == contract_status::DRAFT {
            let conn = self.database.conn()?;
            Contract::set_status(&conn, account, id, contract_status::SENT)?;
        }
        let document_name = document_filename(&contract);
        info!(contract_id = id, %document_name, "contract sent");
        self.event_bus.emit(AppEvent::ContractSent {
            contract_id: contract.id,
            document_name,
        });
        Ok(reply)
    }
}

database_service!(ContractService, "contracts");

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(title: &str, id: &str) -> Contract {
        let mut c = Contract::new("u1", title);
        c.id = id.to_string();
        c
    }

    #[test]
    fn test_document_filename() {
        let c = contract("Website Redesign 2024", "3f2a9c1e-77aa-4bd1-9a0e-000000000000");
        assert_eq!(document_filename(&c), "contrato-website-redesign-2024-3f2a9c1e.pdf");
    }

    #[test]
    fn test_document_filename_collapses_symbols() {
        let c = contract("  --Brand & Logo (v2)!! ", "abc");
        assert_eq!(document_filename(&c), "contrato-brand-logo-v2-abc.pdf");
    }

    #[test]
    fn test_document_filename_keeps_accented_letters() {
        let c = contract("Diseño web: Café Ñandú", "9b1d2c3e-0000");
        assert_eq!(document_filename(&c), "contrato-diseño-web-café-ñandú-9b1d2c3e.pdf");
    }
}
