//! Typed event bus for intra-service communication.
//!
//! Uses tokio broadcast channels to decouple services from one another.
//! Any service can emit events without knowing who is listening, and any
//! number of subscribers can independently consume events.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Application-level state changes other components may care about.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A record was inserted.
    RecordCreated {
        entity: &'static str,
        id: String,
    },
    /// A record's fields or status changed.
    RecordUpdated {
        entity: &'static str,
        id: String,
    },
    /// A record was deleted.
    RecordDeleted {
        entity: &'static str,
        id: String,
    },
    /// Sent invoices past their due date were flagged overdue.
    InvoicesMarkedOverdue {
        count: usize,
    },
    /// A contract was handed to the mail action.
    ContractSent {
        contract_id: String,
        document_name: String,
    },
    /// An automation ran to completion, bookkeeping included.
    AutomationExecuted {
        automation_id: String,
        target_id: String,
        action: String,
        execution_count: i64,
    },
    /// An automation run stopped at `step`.
    AutomationFailed {
        automation_id: String,
        target_id: String,
        step: String,
        error: String,
    },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Every subscriber gets every event. Slow subscribers that fall behind
/// receive a `Lagged` error and miss events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to receive application events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => debug!("event_bus: emitted {label} to {count} subscriber(s)"),
            Err(_) => debug!("event_bus: no subscribers for {label}"),
        }
    }

    /// Get the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Display for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordCreated { entity, id } => write!(f, "{entity} {id} created"),
            Self::RecordUpdated { entity, id } => write!(f, "{entity} {id} updated"),
            Self::RecordDeleted { entity, id } => write!(f, "{entity} {id} deleted"),
            Self::InvoicesMarkedOverdue { count } => write!(f, "{count} invoice(s) marked overdue"),
            Self::ContractSent { contract_id, document_name } => {
                write!(f, "contract {contract_id} sent as {document_name}")
            }
            Self::AutomationExecuted { automation_id, target_id, action, execution_count } => write!(
                f,
                "automation {automation_id} ran {action} for {target_id} (run #{execution_count})"
            ),
            Self::AutomationFailed { automation_id, target_id, step, error } => {
                write!(f, "automation {automation_id} failed at {step} for {target_id}: {error}")
            }
        }
    }
}

/// Human-readable label for an event (for logging).
pub fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::RecordCreated { .. } => "RecordCreated",
        AppEvent::RecordUpdated { .. } => "RecordUpdated",
        AppEvent::RecordDeleted { .. } => "RecordDeleted",
        AppEvent::InvoicesMarkedOverdue { .. } => "InvoicesMarkedOverdue",
        AppEvent::ContractSent { .. } => "ContractSent",
        AppEvent::AutomationExecuted { .. } => "AutomationExecuted",
        AppEvent::AutomationFailed { .. } => "AutomationFailed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_emit_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(AppEvent::RecordCreated {
            entity: "client",
            id: "c-1".into(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event, AppEvent::RecordCreated { entity: "client", id: "c-1".into() });
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(AppEvent::InvoicesMarkedOverdue { count: 3 });

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                AppEvent::InvoicesMarkedOverdue { count } => assert_eq!(count, 3),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn test_no_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.emit(AppEvent::RecordDeleted { entity: "task", id: "t".into() });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_labels() {
        let event = AppEvent::AutomationFailed {
            automation_id: "a".into(),
            target_id: "t".into(),
            step: "dispatch".into(),
            error: "boom".into(),
        };
        assert_eq!(event_label(&event), "AutomationFailed");
        assert_eq!(event.to_string(), "automation a failed at dispatch for t: boom");
        assert_eq!(
            AppEvent::InvoicesMarkedOverdue { count: 2 }.to_string(),
            "2 invoice(s) marked overdue"
        );
    }
}
