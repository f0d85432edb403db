//! Edge function endpoints (`/functions/v1/<name>`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use fd_core::constants::FUNCTIONS_PATH;
use fd_core::error::FdResult;

use crate::client::ApiClient;

/// Body posted to an action function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInvocation {
    pub payload: Value,
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl ApiClient {
    /// Invoke the edge function `name` once and return its JSON reply
    /// (`null` when the function answers with an empty body).
    pub async fn invoke_function(&self, name: &str, invocation: &FunctionInvocation) -> FdResult<Value> {
        let body = serde_json::to_value(invocation)?;
        let resp = self.post_once(&format!("{FUNCTIONS_PATH}/{name}"), &body).await?;
        info!(function = name, status = resp.status().as_u16(), "edge function invoked");

        let text = resp
            .text()
            .await
            .map_err(|e| fd_core::FdError::Http(format!("failed to read function reply: {e}")))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invocation_serialize() {
        let invocation = FunctionInvocation {
            payload: json!({ "clientName": "Acme" }),
            user_id: "u1".into(),
        };
        let value = serde_json::to_value(&invocation).unwrap();
        assert_eq!(value, json!({ "payload": { "clientName": "Acme" }, "userId": "u1" }));
    }
}
