//! Row endpoints (`/rest/v1/<table>`).

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use fd_core::constants::REST_PATH;
use fd_core::error::{FdError, FdResult};

use crate::client::ApiClient;
use crate::query::Query;

impl ApiClient {
    /// Run a select query and deserialize every returned row.
    pub async fn select_rows<T: DeserializeOwned>(&self, query: &Query) -> FdResult<Vec<T>> {
        self.get_json(&query.to_path()).await
    }

    /// Run a select query and return the first row, if any.
    pub async fn select_one<T: DeserializeOwned>(&self, query: &Query) -> FdResult<Option<T>> {
        let rows: Vec<T> = self.select_rows(&query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Run a select query returning rows as loose JSON objects.
    pub async fn select_maps(&self, query: &Query) -> FdResult<Vec<Map<String, Value>>> {
        self.select_rows(query).await
    }

    /// Insert one row and return it as stored.
    pub async fn insert_row(&self, table: &str, row: &Value) -> FdResult<Value> {
        let resp = self.post(&format!("{REST_PATH}/{table}"), row).await?;
        let rows: Vec<Value> = Self::parse_json(resp).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| FdError::Http(format!("insert into {table} returned no row")))
    }

    /// Apply `changes` to every row matching the query's filters.
    /// Returns the updated rows.
    pub async fn update_rows(&self, query: &Query, changes: &Value) -> FdResult<Vec<Value>> {
        let resp = self.patch(&query.to_path(), changes).await?;
        Self::parse_json(resp).await
    }

    /// Delete every row matching the query's filters. Returns how many went.
    pub async fn delete_rows(&self, query: &Query) -> FdResult<usize> {
        let resp = self.delete(&query.to_path()).await?;
        let rows: Vec<Value> = Self::parse_json(resp).await?;
        Ok(rows.len())
    }
}
