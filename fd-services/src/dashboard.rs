//! Dashboard figures for one account.

use std::collections::BTreeMap;

use serde::Serialize;

use fd_core::constants::{invoice_status, project_status, task_status};
use fd_core::error::FdResult;
use fd_models::{queries, Database};

use crate::service::{database_service, ServiceState};

/// Count and amount of the invoices in one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusTotal {
    pub count: i64,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub clients: i64,
    pub active_projects: i64,
    /// Tasks in `todo` or `in_progress`.
    pub open_tasks: i64,
    /// Sum of paid invoices.
    pub revenue: f64,
    /// Sum of sent and overdue invoices.
    pub outstanding: f64,
    pub overdue_invoices: i64,
    /// Paid amounts keyed by `YYYY-MM` of `paid_at`, ascending.
    pub revenue_by_month: BTreeMap<String, f64>,
    pub invoices_by_status: BTreeMap<String, StatusTotal>,
    pub active_automations: i64,
    pub automation_runs: i64,
}

/// Group paid amounts by the month they were paid in. Amounts without a
/// usable `paid_at` are left out.
pub fn revenue_by_month(paid: &[(Option<String>, f64)]) -> BTreeMap<String, f64> {
    let mut months = BTreeMap::new();
    for (paid_at, amount) in paid {
        if let Some(month) = paid_at.as_deref().and_then(fd_core::dates::month_key) {
            *months.entry(month).or_insert(0.0) += amount;
        }
    }
    months
}

pub struct DashboardService {
    state: ServiceState,
    database: Database,
}

impl DashboardService {
    pub fn new(database: Database) -> Self {
        Self {
            state: ServiceState::Created,
            database,
        }
    }

    pub fn metrics(&self, account: &str) -> FdResult<DashboardMetrics> {
        let conn = self.database.conn()?;

        let by_status = queries::invoice_totals_by_status(&conn, account)?;
        let total = |status: &str| by_status.get(status).copied().unwrap_or((0, 0.0));

        let (active_automations, automation_runs) = queries::automation_totals(&conn, account)?;
        let open_tasks = queries::count_for_user(&conn, "tasks", account, Some(task_status::TODO))?
            + queries::count_for_user(&conn, "tasks", account, Some(task_status::IN_PROGRESS))?;

        Ok(DashboardMetrics {
            clients: queries::count_for_user(&conn, "clients", account, None)?,
            active_projects: queries::count_for_user(&conn, "projects", account, Some(project_status::ACTIVE))?,
            open_tasks,
            revenue: total(invoice_status::PAID).1,
            outstanding: total(invoice_status::SENT).1 + total(invoice_status::OVERDUE).1,
            overdue_invoices: total(invoice_status::OVERDUE).0,
            revenue_by_month: revenue_by_month(&queries::paid_invoice_amounts(&conn, account)?),
            invoices_by_status: by_status
                .iter()
                .map(|(status, (count, amount))| {
                    (status.clone(), StatusTotal { count: *count, amount: *amount })
                })
                .collect(),
            active_automations,
            automation_runs,
        })
    }
}

database_service!(DashboardService, "dashboard");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revenue_by_month() {
        let paid = vec![
            (Some("2024-03-02T10:00:00Z".to_string()), 100.0),
            (Some("2024-01-15".to_string()), 50.0),
            (Some("2024-03-28T09:00:00Z".to_string()), 25.5),
            (None, 999.0),
        ];
        let months = revenue_by_month(&paid);
        let keys: Vec<_> = months.keys().cloned().collect();
        assert_eq!(keys, vec!["2024-01", "2024-03"]);
        assert_eq!(months["2024-03"], 125.5);
    }
}
