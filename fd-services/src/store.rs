//! Record stores used by the automation dispatcher.
//!
//! The dispatcher only needs projected reads and a counter bump, so it talks
//! to a `RecordStore` rather than to SQLite or HTTP directly. `LocalStore`
//! uses the local database; `RemoteStore` uses the hosted backend.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use fd_api::{ApiClient, Query};
use fd_core::error::{FdError, FdResult};
use fd_models::{queries, Automation, Database, RowMap};

/// Account-scoped record access for automation runs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short name for logs ("local", "remote").
    fn name(&self) -> &str;

    /// Up to `limit` rows of `table` owned by `account`, projected onto `columns`.
    async fn select(&self, table: &str, columns: &[&str], account: &str, limit: u32) -> FdResult<Vec<RowMap>>;

    /// One row of `table` by id, owned by `account`.
    async fn find(&self, table: &str, columns: &[&str], account: &str, id: &str) -> FdResult<Option<RowMap>>;

    /// Load an automation owned by `account`.
    async fn automation(&self, account: &str, id: &str) -> FdResult<Option<Automation>>;

    /// Count one successful run at `at` and return the new execution count.
    async fn record_execution(&self, automation_id: &str, account: &str, at: &str) -> FdResult<i64>;
}

// ─── Local ──────────────────────────────────────────────────────────────────

/// Store backed by the local SQLite database.
#[derive(Clone)]
pub struct LocalStore {
    database: Database,
}

impl LocalStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn select(&self, table: &str, columns: &[&str], account: &str, limit: u32) -> FdResult<Vec<RowMap>> {
        let conn = self.database.conn()?;
        queries::select_projection(&conn, table, columns, account, limit)
    }

    async fn find(&self, table: &str, columns: &[&str], account: &str, id: &str) -> FdResult<Option<RowMap>> {
        let conn = self.database.conn()?;
        queries::find_projection(&conn, table, columns, account, id)
    }

    async fn automation(&self, account: &str, id: &str) -> FdResult<Option<Automation>> {
        let conn = self.database.conn()?;
        Automation::find_by_id(&conn, account, id)
    }

    async fn record_execution(&self, automation_id: &str, account: &str, at: &str) -> FdResult<i64> {
        let conn = self.database.conn()?;
        Automation::record_execution(&conn, account, automation_id, at)
    }
}

// ─── Remote ─────────────────────────────────────────────────────────────────

/// Store backed by the hosted backend's row API.
#[derive(Clone)]
pub struct RemoteStore {
    api: ApiClient,
}

impl RemoteStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RecordStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn select(&self, table: &str, columns: &[&str], account: &str, limit: u32) -> FdResult<Vec<RowMap>> {
        let query = Query::table(table)
            .select(columns)
            .eq("user_id", account)
            .order("created_at", false)
            .limit(limit);
        self.api.select_maps(&query).await
    }

    async fn find(&self, table: &str, columns: &[&str], account: &str, id: &str) -> FdResult<Option<RowMap>> {
        let query = Query::table(table)
            .select(columns)
            .eq("id", id)
            .eq("user_id", account);
        self.api.select_one(&query).await
    }

    async fn automation(&self, account: &str, id: &str) -> FdResult<Option<Automation>> {
        let query = Query::table("automations").eq("id", id).eq("user_id", account);
        self.api.select_one(&query).await
    }

    /// Reads the stored counter, then writes `count + 1`. Two runs racing
    /// each other can both read the same count.
    async fn record_execution(&self, automation_id: &str, account: &str, at: &str) -> FdResult<i64> {
        let filter = Query::table("automations")
            .eq("id", automation_id)
            .eq("user_id", account);

        let current: Option<RowMap> = self
            .api
            .select_one(&filter.clone().select(&["execution_count"]))
            .await?;
        let current = current.ok_or_else(|| FdError::not_found("automation", automation_id))?;
        let count = current
            .get("execution_count")
            .and_then(Value::as_i64)
            .unwrap_or(0);

        let next = count + 1;
        let updated = self
            .api
            .update_rows(&filter, &json!({ "execution_count": next, "last_executed_at": at }))
            .await?;
        if updated.is_empty() {
            return Err(FdError::not_found("automation", automation_id));
        }
        debug!(automation_id, count = next, "remote execution count updated");
        Ok(next)
    }
}
