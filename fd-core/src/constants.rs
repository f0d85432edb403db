//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "FreelanceDesk";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory name used under the platform data/config dirs.
pub const APP_DIR_NAME: &str = "FreelanceDesk";

/// Default SQLite database file name.
pub const DB_FILE_NAME: &str = "freelancedesk.db";

/// Rolling log file prefix.
pub const LOG_FILE_NAME: &str = "freelancedesk.log";

/// REST path prefix of the hosted backend.
pub const REST_PATH: &str = "/rest/v1";

/// Auth path prefix of the hosted backend.
pub const AUTH_PATH: &str = "/auth/v1";

/// Edge function path prefix of the hosted backend.
pub const FUNCTIONS_PATH: &str = "/functions/v1";

/// Default backend API timeout in milliseconds.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;

/// Maximum number of candidate rows fetched for an automation target picker.
pub const AUTOMATION_CANDIDATE_LIMIT: u32 = 50;

/// Database schema version.
pub const DB_SCHEMA_VERSION: i32 = 2;

/// Prefix of generated invoice numbers ("F-12").
pub const INVOICE_NUMBER_PREFIX: &str = "F-";

/// Prefix of generated contract document file names.
pub const CONTRACT_DOCUMENT_PREFIX: &str = "contrato";

/// Project status values.
pub mod project_status {
    pub const PLANNING: &str = "planning";
    pub const ACTIVE: &str = "active";
    pub const ON_HOLD: &str = "on_hold";
    pub const COMPLETED: &str = "completed";
    pub const CANCELLED: &str = "cancelled";

    /// All valid project statuses.
    pub const ALL: &[&str] = &[PLANNING, ACTIVE, ON_HOLD, COMPLETED, CANCELLED];
}

/// Task status values.
pub mod task_status {
    pub const TODO: &str = "todo";
    pub const IN_PROGRESS: &str = "in_progress";
    pub const DONE: &str = "done";

    /// All valid task statuses.
    pub const ALL: &[&str] = &[TODO, IN_PROGRESS, DONE];
}

/// Task priority values.
pub mod task_priority {
    pub const LOW: &str = "low";
    pub const MEDIUM: &str = "medium";
    pub const HIGH: &str = "high";

    /// All valid priorities.
    pub const ALL: &[&str] = &[LOW, MEDIUM, HIGH];
}

/// Invoice status values.
pub mod invoice_status {
    pub const DRAFT: &str = "draft";
    pub const SENT: &str = "sent";
    pub const PAID: &str = "paid";
    pub const OVERDUE: &str = "overdue";
    pub const CANCELLED: &str = "cancelled";

    /// All valid invoice statuses.
    pub const ALL: &[&str] = &[DRAFT, SENT, PAID, OVERDUE, CANCELLED];
}

/// Contract status values.
pub mod contract_status {
    pub const DRAFT: &str = "draft";
    pub const SENT: &str = "sent";
    pub const SIGNED: &str = "signed";
    pub const EXPIRED: &str = "expired";
    pub const CANCELLED: &str = "cancelled";

    /// All valid contract statuses.
    pub const ALL: &[&str] = &[DRAFT, SENT, SIGNED, EXPIRED, CANCELLED];
}

/// Validate that `value` is one of `allowed`, naming the field on failure.
pub fn check_status(field: &str, value: &str, allowed: &[&str]) -> crate::FdResult<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(crate::FdError::Validation(format!(
            "{field} must be one of {}, got \"{value}\"",
            allowed.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_sets() {
        assert_eq!(invoice_status::ALL.len(), 5);
        assert!(project_status::ALL.contains(&"on_hold"));
        assert!(task_status::ALL.contains(&"in_progress"));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status("status", "paid", invoice_status::ALL).is_ok());
        let err = check_status("status", "lost", invoice_status::ALL).unwrap_err();
        assert!(err.to_string().contains("lost"));
    }
}
