//! Auth endpoints (`/auth/v1`).

use serde::{Deserialize, Serialize};
use fd_core::constants::AUTH_PATH;
use fd_core::error::FdResult;

use crate::client::ApiClient;

/// The account behind the configured access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ApiClient {
    /// Resolve the account of the access token.
    pub async fn current_user(&self) -> FdResult<AuthUser> {
        self.get_json(&format!("{AUTH_PATH}/user")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_ignores_extra_fields() {
        let json = r#"{"id":"u1","aud":"authenticated","email":"ana@studio.io","app_metadata":{}}"#;
        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email.as_deref(), Some("ana@studio.io"));
    }
}
