//! Invoice entity model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, OptionalExtension, Row};
use fd_core::constants::{check_status, invoice_status, INVOICE_NUMBER_PREFIX};
use fd_core::error::{FdError, FdResult};

use super::{db_err, new_id, optional, require_text};

/// A bill issued to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    pub invoice_number: String,
    pub amount: f64,
    pub status: String,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
    pub created_at: String,
}

impl Invoice {
    /// A new unsaved draft invoice.
    pub fn new(user_id: &str, invoice_number: &str, amount: f64) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            client_id: None,
            project_id: None,
            invoice_number: invoice_number.to_string(),
            amount,
            status: invoice_status::DRAFT.to_string(),
            issue_date: None,
            due_date: None,
            paid_at: None,
            created_at: fd_core::dates::now_rfc3339(),
        }
    }

    /// Construct an Invoice from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            client_id: row.get("client_id")?,
            project_id: row.get("project_id")?,
            invoice_number: row.get("invoice_number")?,
            amount: row.get("amount")?,
            status: row.get("status")?,
            issue_date: row.get("issue_date")?,
            due_date: row.get("due_date")?,
            paid_at: row.get("paid_at")?,
            created_at: row.get("created_at")?,
        })
    }

    fn validate(&self) -> FdResult<()> {
        require_text("invoice number", &self.invoice_number)?;
        check_status("invoice status", &self.status, invoice_status::ALL)?;
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(FdError::Validation(format!(
                "invoice amount must be a non-negative number, got {}",
                self.amount
            )));
        }
        for date in [self.issue_date.as_deref(), self.due_date.as_deref()].into_iter().flatten() {
            fd_core::dates::parse_date(date)?;
        }
        Ok(())
    }

    /// Whether the invoice is unpaid and past `today`.
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        if self.status != invoice_status::SENT && self.status != invoice_status::OVERDUE {
            return false;
        }
        self.due_date
            .as_deref()
            .and_then(|d| fd_core::dates::parse_date(d).ok())
            .map(|due| due < today)
            .unwrap_or(false)
    }

    // ─── Static finders ──────────────────────────────────────────────────

    /// Find an invoice of the account by id.
    pub fn find_by_id(conn: &Connection, user_id: &str, id: &str) -> FdResult<Option<Self>> {
        optional(conn.query_row(
            "SELECT * FROM invoices WHERE id = ?1 AND user_id = ?2",
            [id, user_id],
            Self::from_row,
        ))
    }

    /// Invoices of the account, newest first, optionally filtered by status.
    pub fn list_for_user(conn: &Connection, user_id: &str, status: Option<&str>) -> FdResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM invoices
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

    /// Next free invoice number for the account: `F-<count + 1>`, skipping
    /// numbers already taken.
    pub fn next_number(conn: &Connection, user_id: &str) -> FdResult<String> {
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM invoices WHERE user_id = ?1", [user_id], |row| row.get(0))
            .map_err(db_err)?;
        let mut n = count + 1;
        loop {
            let candidate = format!("{INVOICE_NUMBER_PREFIX}{n}");
            let taken = conn
                .query_row(
                    "SELECT 1 FROM invoices WHERE user_id = ?1 AND invoice_number = ?2",
                    [user_id, candidate.as_str()],
                    |_| Ok(()),
                )
                .optional()
                .map_err(db_err)?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Insert this invoice.
    pub fn insert(&self, conn: &Connection) -> FdResult<()> {
        self.validate()?;
        conn.execute(
            "INSERT INTO invoices (
                id, user_id, client_id, project_id, invoice_number, amount,
                status, issue_date, due_date, paid_at, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
            params![
                self.id,
                self.user_id,
                self.client_id,
                self.project_id,
                self.invoice_number,
                self.amount,
                self.status,
                self.issue_date,
                self.due_date,
                self.paid_at,
                self.created_at,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Change the status of an invoice. Moving to `paid` stamps `paid_at`;
    /// moving away from it clears the stamp.
    pub fn set_status(conn: &Connection, user_id: &str, id: &str, status: &str, at: &str) -> FdResult<()> {
        check_status("invoice status", status, invoice_status::ALL)?;
        let paid_at = (status == invoice_status::PAID).then_some(at);
        let changed = conn
            .execute(
                "UPDATE invoices SET status = ?3, paid_at = ?4 WHERE id = ?1 AND user_id = ?2",
                params![id, user_id, status, paid_at],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(FdError::not_found("invoice", id));
        }
        Ok(())
    }

    /// Flag every `sent` invoice due before `today` as `overdue`.
    /// Returns how many invoices changed.
    pub fn mark_overdue_before(conn: &Connection, user_id: &str, today: NaiveDate) -> FdResult<usize> {
        let cutoff = today.format("%Y-%m-%d").to_string();
        conn.execute(
            "UPDATE invoices SET status = ?2
             WHERE user_id = ?1 AND status = ?3
               AND due_date IS NOT NULL AND due_date < ?4",
            params![user_id, invoice_status::OVERDUE, invoice_status::SENT, cutoff],
        )
        .map_err(db_err)
    }

    /// Delete an invoice of the account.
    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> FdResult<bool> {
        let changed = conn
            .execute("DELETE FROM invoices WHERE id = ?1 AND user_id = ?2", [id, user_id])
            .map_err(db_err)?;
        Ok(changed > 0)
    }
}
