//! Action executors.
//!
//! An action is a named side-effect function (send an email, post a
//! notice) that receives a JSON payload and the account id. Executors decide
//! where the call goes.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use fd_api::{ApiClient, FunctionInvocation};
use fd_core::error::{FdError, FdResult};
use fd_models::{Database, OutboxEntry};

#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Short name for logs ("http", "outbox").
    fn name(&self) -> &str;

    /// Perform `action` with `payload` on behalf of `account`.
    /// Returns whatever the action replied.
    async fn execute(&self, action: &str, payload: &Value, account: &str) -> FdResult<Value>;
}

/// Invokes the backend edge function named by the action.
#[derive(Clone)]
pub struct HttpActionExecutor {
    api: ApiClient,
}

impl HttpActionExecutor {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ActionExecutor for HttpActionExecutor {
    fn name(&self) -> &str {
        "http"
    }

    async fn execute(&self, action: &str, payload: &Value, account: &str) -> FdResult<Value> {
        let invocation = FunctionInvocation {
            payload: payload.clone(),
            user_id: account.to_string(),
        };
        self.api
            .invoke_function(action, &invocation)
            .await
            .map_err(|e| FdError::ActionFailed {
                action: action.to_string(),
                message: e.to_string(),
            })
    }
}

/// Records the action in the local outbox table instead of sending it.
#[derive(Clone)]
pub struct OutboxActionExecutor {
    database: Database,
}

impl OutboxActionExecutor {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl ActionExecutor for OutboxActionExecutor {
    fn name(&self) -> &str {
        "outbox"
    }

    async fn execute(&self, action: &str, payload: &Value, account: &str) -> FdResult<Value> {
        let conn = self.database.conn()?;
        let id = OutboxEntry::insert(&conn, account, action, payload, &fd_core::dates::now_rfc3339())?;
        info!(action, outbox_id = id, "action queued in outbox");
        Ok(json!({ "outboxId": id }))
    }
}
