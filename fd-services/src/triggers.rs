//! Trigger table.
//!
//! Every trigger type maps to one descriptor: the entity its targets are
//! drawn from and the action it dispatches. Each entity kind in turn fixes
//! the source table and column projection. Lookups index the static table;
//! there is no per-trigger branching elsewhere.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use fd_core::error::FdError;

/// Automation trigger types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    ClientOnboarding,
    ClientFollowup,
    InvoiceFollowup,
    InvoiceOverdue,
    ProjectUpdate,
    ProjectCompleted,
}

/// Record kinds an automation can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Client,
    Invoice,
    Project,
}

/// Static facts about one trigger type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerDescriptor {
    pub trigger: TriggerType,
    pub entity: EntityKind,
    /// Name of the side-effect function invoked on dispatch.
    pub action: &'static str,
    /// Short description for listings.
    pub label: &'static str,
}

/// The trigger table, in `TriggerType` declaration order.
pub static TRIGGERS: [TriggerDescriptor; 6] = [
    TriggerDescriptor {
        trigger: TriggerType::ClientOnboarding,
        entity: EntityKind::Client,
        action: "send_welcome_email",
        label: "Welcome email for a new client",
    },
    TriggerDescriptor {
        trigger: TriggerType::ClientFollowup,
        entity: EntityKind::Client,
        action: "send_followup_email",
        label: "Follow-up email to a client",
    },
    TriggerDescriptor {
        trigger: TriggerType::InvoiceFollowup,
        entity: EntityKind::Invoice,
        action: "send_payment_reminder",
        label: "Payment reminder for an invoice",
    },
    TriggerDescriptor {
        trigger: TriggerType::InvoiceOverdue,
        entity: EntityKind::Invoice,
        action: "send_overdue_notice",
        label: "Overdue notice for an invoice",
    },
    TriggerDescriptor {
        trigger: TriggerType::ProjectUpdate,
        entity: EntityKind::Project,
        action: "send_project_update",
        label: "Status update on a project",
    },
    TriggerDescriptor {
        trigger: TriggerType::ProjectCompleted,
        entity: EntityKind::Project,
        action: "send_project_completion",
        label: "Completion notice for a project",
    },
];

impl TriggerType {
    pub const ALL: [TriggerType; 6] = [
        TriggerType::ClientOnboarding,
        TriggerType::ClientFollowup,
        TriggerType::InvoiceFollowup,
        TriggerType::InvoiceOverdue,
        TriggerType::ProjectUpdate,
        TriggerType::ProjectCompleted,
    ];

    pub fn descriptor(self) -> &'static TriggerDescriptor {
        &TRIGGERS[self as usize]
    }

    pub fn entity(self) -> EntityKind {
        self.descriptor().entity
    }

    pub fn action(self) -> &'static str {
        self.descriptor().action
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientOnboarding => "client_onboarding",
            Self::ClientFollowup => "client_followup",
            Self::InvoiceFollowup => "invoice_followup",
            Self::InvoiceOverdue => "invoice_overdue",
            Self::ProjectUpdate => "project_update",
            Self::ProjectCompleted => "project_completed",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = FdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| FdError::UnknownTrigger(s.to_string()))
    }
}

impl EntityKind {
    /// Source table of candidate rows.
    pub fn table(self) -> &'static str {
        match self {
            Self::Client => "clients",
            Self::Invoice => "invoices",
            Self::Project => "projects",
        }
    }

    /// Columns read for candidates and payloads.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Client => &["id", "name", "email", "company"],
            Self::Invoice => &["id", "invoice_number", "amount", "due_date", "client_id"],
            Self::Project => &["id", "name", "description", "client_id", "budget"],
        }
    }

    /// Singular name used in messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Invoice => "invoice",
            Self::Project => "project",
        }
    }

    /// Whether rows carry a `client_id` that payloads resolve.
    pub fn links_client(self) -> bool {
        !matches!(self, Self::Client)
    }

    /// Column shown to identify a candidate in a picker.
    pub fn title_column(self) -> &'static str {
        match self {
            Self::Invoice => "invoice_number",
            Self::Client | Self::Project => "name",
        }
    }
}

/// Columns read from `clients` when resolving a linked client.
pub const LINKED_CLIENT_COLUMNS: &[&str] = &["id", "name", "email"];
