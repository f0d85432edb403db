//! Invoice service.
//!
//! Creation with automatic numbering, the draft → sent → paid lifecycle and
//! the overdue sweep.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fd_core::constants::invoice_status;
use fd_core::error::{FdError, FdResult};
use fd_models::{Client, Database, Invoice};

use crate::client::non_empty;
use crate::event_bus::{AppEvent, EventBus};
use crate::service::{database_service, ServiceState};

/// Fields accepted when creating an invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceInput {
    /// Generated as `F-<n>` when absent.
    pub invoice_number: Option<String>,
    pub amount: f64,
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
}

pub struct InvoiceService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl InvoiceService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    pub fn list(&self, account: &str, status: Option<&str>) -> FdResult<Vec<Invoice>> {
        let conn = self.database.conn()?;
        Invoice::list_for_user(&conn, account, status)
    }

    pub fn get(&self, account: &str, id: &str) -> FdResult<Invoice> {
        let conn = self.database.conn()?;
        Invoice::find_by_id(&conn, account, id)?.ok_or_else(|| FdError::not_found("invoice", id))
    }

    pub fn create(&self, account: &str, input: InvoiceInput) -> FdResult<Invoice> {
        let conn = self.database.conn()?;

        let number = match non_empty(input.invoice_number) {
            Some(number) => number,
            None => Invoice::next_number(&conn, account)?,
        };
        let mut invoice = Invoice::new(account, &number, input.amount);
        if let Some(client_id) = non_empty(input.client_id) {
            if Client::find_by_id(&conn, account, &client_id)?.is_none() {
                return Err(FdError::not_found("client", &client_id));
            }
            invoice.client_id = Some(client_id);
        }
        invoice.project_id = non_empty(input.project_id);
        invoice.issue_date = non_empty(input.issue_date).or_else(|| Some(fd_core::dates::today()));
        invoice.due_date = non_empty(input.due_date);
        invoice.insert(&conn)?;

        info!("created invoice {} for {:.2}", invoice.invoice_number, invoice.amount);
        self.event_bus.emit(AppEvent::RecordCreated {
            entity: "invoice",
            id: invoice.id.clone(),
        });
        Ok(invoice)
    }

    pub fn mark_sent(&self, account: &str, id: &str) -> FdResult<()> {
        self.set_status(account, id, invoice_status::SENT)
    }

    /// Mark paid now. `paid_at` drives the revenue-by-month figures.
    pub fn mark_paid(&self, account: &str, id: &str) -> FdResult<()> {
        self.set_status(account, id, invoice_status::PAID)
    }

    pub fn set_status(&self, account: &str, id: &str, status: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        Invoice::set_status(&conn, account, id, status, &fd_core::dates::now_rfc3339())?;
        debug!("invoice {id} is now {status}");
        self.event_bus.emit(AppEvent::RecordUpdated {
            entity: "invoice",
            id: id.to_string(),
        });
        Ok(())
    }

    /// Flag sent invoices due before `today` as overdue.
    pub fn mark_overdue(&self, account: &str, today: NaiveDate) -> FdResult<usize> {
        let conn = self.database.conn()?;
        let count = Invoice::mark_overdue_before(&conn, account, today)?;
        if count > 0 {
            info!("{count} invoice(s) now overdue");
            self.event_bus.emit(AppEvent::InvoicesMarkedOverdue { count });
        }
        Ok(count)
    }

    pub fn delete(&self, account: &str, id: &str) -> FdResult<()> {
        let conn = self.database.conn()?;
        if !Invoice::delete(&conn, account, id)? {
            return Err(FdError::not_found("invoice", id));
        }
        self.event_bus.emit(AppEvent::RecordDeleted {
            entity: "invoice",
            id: id.to_string(),
        });
        Ok(())
    }
}

database_service!(InvoiceService, "invoices");
