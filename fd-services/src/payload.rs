//! Action payload construction.
//!
//! A payload is a flat JSON object with camelCase keys. Values are copied
//! from the projected row as they are; a column missing from the row becomes
//! `null`. Keys come out sorted, so the same inputs always serialize to the
//! same bytes.

use serde_json::{Map, Value};
use fd_models::{Automation, RowMap};

use crate::triggers::{EntityKind, TriggerType};

/// `(payload key, row column)` pairs copied for each entity kind.
fn field_map(entity: EntityKind) -> &'static [(&'static str, &'static str)] {
    match entity {
        EntityKind::Client => &[
            ("clientId", "id"),
            ("clientName", "name"),
            ("clientEmail", "email"),
            ("clientCompany", "company"),
        ],
        EntityKind::Invoice => &[
            ("invoiceId", "id"),
            ("invoiceNumber", "invoice_number"),
            ("invoiceAmount", "amount"),
            ("dueDate", "due_date"),
            ("clientId", "client_id"),
        ],
        EntityKind::Project => &[
            ("projectId", "id"),
            ("projectName", "name"),
            ("projectDescription", "description"),
            ("projectBudget", "budget"),
            ("clientId", "client_id"),
        ],
    }
}

fn field(row: &RowMap, column: &str) -> Value {
    row.get(column).cloned().unwrap_or(Value::Null)
}

/// The `client_id` of a row, if it has a non-empty one.
pub fn linked_client_id(row: &RowMap) -> Option<String> {
    match row.get("client_id") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Build the payload sent for `trigger` against `row`.
///
/// `client` is the resolved linked client for invoice and project triggers;
/// `None` yields null client fields.
pub fn build_payload(
    automation: &Automation,
    trigger: TriggerType,
    row: &RowMap,
    client: Option<&RowMap>,
) -> Value {
    let entity = trigger.entity();
    let mut payload = Map::new();

    for (key, column) in field_map(entity) {
        payload.insert((*key).to_string(), field(row, column));
    }

    if entity.links_client() {
        let (name, email) = match client {
            Some(c) => (field(c, "name"), field(c, "email")),
            None => (Value::Null, Value::Null),
        };
        payload.insert("clientName".into(), name);
        payload.insert("clientEmail".into(), email);
    }

    payload.insert("automationName".into(), Value::String(automation.name.clone()));
    payload.insert("triggerType".into(), Value::String(trigger.as_str().into()));
    Value::Object(payload)
}
