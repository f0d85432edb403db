//! Global error types for FreelanceDesk.
//!
//! All error categories across the application are unified into a single
//! `FdError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using FdError.
pub type FdResult<T> = Result<T, FdError>;

/// Unified error type covering all error categories in FreelanceDesk.
#[derive(Error, Debug)]
pub enum FdError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Database errors --
    /// SQLite database error.
    #[error("database error: {0}")]
    Database(String),

    /// Database migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    // -- Network errors --
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(String),

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Backend returned an error response.
    #[error("server error (status {status}): {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Error message from the backend.
        message: String,
    },

    /// Authentication failed or the access token was rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    // -- Domain errors --
    /// A record was not found in the account's data.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "client".
        entity: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// Input failed validation.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Trigger type string does not name a known trigger.
    #[error("unknown trigger type: {0}")]
    UnknownTrigger(String),

    /// Automation exists but is switched off.
    #[error("automation is inactive: {0}")]
    InactiveAutomation(String),

    /// The side-effect function of an automation or contract send failed.
    #[error("action {action} failed: {message}")]
    ActionFailed {
        /// Action name, e.g. "send_welcome_email".
        action: String,
        /// Failure detail.
        message: String,
    },

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Service errors --
    /// A service failed to initialize.
    #[error("service init error: {0}")]
    ServiceInit(String),

    /// A service is not yet initialized.
    #[error("service not initialized: {0}")]
    ServiceNotInitialized(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FdError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &str, id: &str) -> Self {
        FdError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Whether this error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FdError::NotFound { .. })
    }
}

impl From<serde_json::Error> for FdError {
    fn from(e: serde_json::Error) -> Self {
        FdError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for FdError {
    fn from(e: toml::de::Error) -> Self {
        FdError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fd_error_display() {
        let err = FdError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_not_found_display() {
        let err = FdError::not_found("client", "abc");
        assert_eq!(err.to_string(), "client not found: abc");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_action_failed_display() {
        let err = FdError::ActionFailed {
            action: "send_welcome_email".into(),
            message: "smtp down".into(),
        };
        assert_eq!(err.to_string(), "action send_welcome_email failed: smtp down");
        assert!(!err.is_not_found());
    }
}
