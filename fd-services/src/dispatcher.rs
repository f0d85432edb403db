//! Automation dispatcher.
//!
//! Runs one automation against one target record in four steps:
//!
//! 1. **Resolve**: the trigger type picks the source table and projection;
//!    the target row is read from the account's records.
//! 2. **Build payload**: row fields are copied into a flat payload; invoice
//!    and project triggers also read the linked client's name and email.
//! 3. **Dispatch**: the trigger's action is invoked with the payload and the
//!    account id.
//! 4. **Bookkeeping**: the automation's execution count goes up by one and
//!    its last-executed timestamp is set.
//!
//! The first failing step ends the run. Its error is appended to the run log
//! and nothing after it happens; nothing is retried or undone. Running the
//! same automation against the same record twice sends the action twice.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use fd_core::constants::AUTOMATION_CANDIDATE_LIMIT;
use fd_core::error::{FdError, FdResult};
use fd_models::{Automation, RowMap};

use crate::event_bus::{AppEvent, EventBus};
use crate::executor::ActionExecutor;
use crate::payload::{build_payload, linked_client_id};
use crate::store::RecordStore;
use crate::triggers::{TriggerType, LINKED_CLIENT_COLUMNS};

/// Stage of a run, used to say where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStep {
    Resolve,
    BuildPayload,
    Dispatch,
    Bookkeeping,
}

impl fmt::Display for DispatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolve",
            Self::BuildPayload => "build_payload",
            Self::Dispatch => "dispatch",
            Self::Bookkeeping => "bookkeeping",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Succeeded {
        executed_at: String,
        execution_count: i64,
    },
    Failed {
        step: DispatchStep,
        error: String,
    },
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    pub automation_id: String,
    pub target_id: String,
    /// Action name, once the trigger type resolved.
    pub action: Option<String>,
    /// Payload, once it was built.
    pub payload: Option<Value>,
    /// Human-readable progress and error lines, in order.
    pub log: Vec<String>,
    pub outcome: DispatchOutcome,
}

impl DispatchReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Succeeded { .. })
    }

    /// The step the run stopped at, if it failed.
    pub fn failed_step(&self) -> Option<DispatchStep> {
        match &self.outcome {
            DispatchOutcome::Failed { step, .. } => Some(*step),
            DispatchOutcome::Succeeded { .. } => None,
        }
    }
}

/// Runs automations through a record store and an action executor.
#[derive(Clone)]
pub struct AutomationDispatcher {
    store: Arc<dyn RecordStore>,
    executor: Arc<dyn ActionExecutor>,
    event_bus: EventBus,
    candidate_limit: u32,
}

/// Progress of a run while it is in flight.
struct RunState {
    log: Vec<String>,
    action: Option<String>,
    payload: Option<Value>,
}

type StepResult<T> = Result<T, (DispatchStep, FdError)>;

fn at<T>(step: DispatchStep, result: FdResult<T>) -> StepResult<T> {
    result.map_err(|e| (step, e))
}

impl AutomationDispatcher {
    pub fn new(store: Arc<dyn RecordStore>, executor: Arc<dyn ActionExecutor>, event_bus: EventBus) -> Self {
        Self {
            store,
            executor,
            event_bus,
            candidate_limit: AUTOMATION_CANDIDATE_LIMIT,
        }
    }

    /// Cap on candidate rows. Zero falls back to the default.
    pub fn with_candidate_limit(mut self, limit: u32) -> Self {
        self.candidate_limit = if limit == 0 { AUTOMATION_CANDIDATE_LIMIT } else { limit };
        self
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn executor(&self) -> &dyn ActionExecutor {
        self.executor.as_ref()
    }

    /// Load an automation of `account` through the store.
    pub async fn load(&self, account: &str, automation_id: &str) -> FdResult<Automation> {
        self.store
            .automation(account, automation_id)
            .await?
            .ok_or_else(|| FdError::not_found("automation", automation_id))
    }

    /// Rows the automation could run against: step 1 without a target.
    pub async fn candidates(&self, automation: &Automation) -> FdResult<Vec<RowMap>> {
        let trigger: TriggerType = automation.trigger_type.parse()?;
        let entity = trigger.entity();
        self.store
            .select(entity.table(), entity.columns(), &automation.user_id, self.candidate_limit)
            .await
    }

    /// Run `automation` against the record `target_id`.
    pub async fn run(&self, automation: &Automation, target_id: &str) -> DispatchReport {
        let mut state = RunState {
            log: Vec::new(),
            action: None,
            payload: None,
        };

        info!(
            automation_id = %automation.id,
            trigger = %automation.trigger_type,
            target_id,
            store = self.store.name(),
            executor = self.executor.name(),
            "running automation"
        );

        let outcome = match self.dispatch(automation, target_id, &mut state).await {
            Ok((executed_at, execution_count)) => {
                self.event_bus.emit(AppEvent::AutomationExecuted {
                    automation_id: automation.id.clone(),
                    target_id: target_id.to_string(),
                    action: state.action.clone().unwrap_or_default(),
                    execution_count,
                });
                DispatchOutcome::Succeeded { executed_at, execution_count }
            }
            Err((step, err)) => {
                let line = format!("{step} failed: {err}");
                error!(automation_id = %automation.id, target_id, %step, "{line}");
                state.log.push(line);
                self.event_bus.emit(AppEvent::AutomationFailed {
                    automation_id: automation.id.clone(),
                    target_id: target_id.to_string(),
                    step: step.to_string(),
                    error: err.to_string(),
                });
                DispatchOutcome::Failed { step, error: err.to_string() }
            }
        };

        DispatchReport {
            automation_id: automation.id.clone(),
            target_id: target_id.to_string(),
            action: state.action,
            payload: state.payload,
            log: state.log,
            outcome,
        }
    }

    async fn dispatch(
        &self,
        automation: &Automation,
        target_id: &str,
        state: &mut RunState,
    ) -> StepResult<(String, i64)> {
        let account = automation.user_id.as_str();

        // 1. Resolve
        if !automation.is_active {
            return Err((DispatchStep::Resolve, FdError::InactiveAutomation(automation.name.clone())));
        }
        let trigger: TriggerType = at(DispatchStep::Resolve, automation.trigger_type.parse())?;
        let descriptor = trigger.descriptor();
        let entity = descriptor.entity;
        state.action = Some(descriptor.action.to_string());

        let row = at(
            DispatchStep::Resolve,
            self.store.find(entity.table(), entity.columns(), account, target_id).await,
        )?
        .ok_or_else(|| (DispatchStep::Resolve, FdError::not_found(entity.noun(), target_id)))?;
        state.log.push(format!("resolved {} {target_id} from {}", entity.noun(), entity.table()));

        // 2. Build payload
        let client = match linked_client_id(&row).filter(|_| entity.links_client()) {
            Some(client_id) => {
                let client = at(
                    DispatchStep::BuildPayload,
                    self.store.find("clients", LINKED_CLIENT_COLUMNS, account, &client_id).await,
                )?
                .ok_or_else(|| (DispatchStep::BuildPayload, FdError::not_found("linked client", &client_id)))?;
                state.log.push(format!("linked client {client_id} resolved"));
                Some(client)
            }
            None => None,
        };
        let payload = build_payload(automation, trigger, &row, client.as_ref());
        state.payload = Some(payload.clone());
        state.log.push(format!("payload built for {}", descriptor.action));

        // 3. Dispatch
        let reply = at(
            DispatchStep::Dispatch,
            self.executor.execute(descriptor.action, &payload, account).await,
        )?;
        state.log.push(format!("{} dispatched via {}", descriptor.action, self.executor.name()));
        if !reply.is_null() {
            info!(action = descriptor.action, %reply, "action replied");
        }

        // 4. Bookkeeping
        let executed_at = fd_core::dates::now_rfc3339();
        let count = match self.store.record_execution(&automation.id, account, &executed_at).await {
            Ok(count) => count,
            Err(e) => {
                warn!(automation_id = %automation.id, "action sent but execution count not updated: {e}");
                return Err((DispatchStep::Bookkeeping, e));
            }
        };
        state.log.push(format!("execution #{count} recorded at {executed_at}"));

        Ok((executed_at, count))
    }
}
