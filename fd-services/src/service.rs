//! Service lifecycle.
//!
//! Every entity service sits on the shared [`Database`](fd_models::Database)
//! and goes through the same states: created, running after `init`, stopped
//! after `shutdown`. A service whose database pool cannot hand out a
//! connection during `init` ends up `Failed`.

use fd_core::error::FdResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Created,
    /// `init` is in progress.
    Initializing,
    Running,
    Stopped,
    Failed,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        })
    }
}

/// A service managed by the [`ServiceRegistry`](crate::registry::ServiceRegistry).
pub trait Service: Send + Sync {
    /// Registry key, e.g. `"invoices"`.
    fn name(&self) -> &str;

    fn state(&self) -> ServiceState;

    fn init(&mut self) -> FdResult<()>;

    fn shutdown(&mut self) -> FdResult<()>;

    fn is_healthy(&self) -> bool {
        self.state() == ServiceState::Running
    }
}

/// `Service` impl for a struct with `state: ServiceState` and
/// `database: Database` fields. `init` checks out one pooled connection.
macro_rules! database_service {
    ($ty:ty, $name:literal) => {
        impl $crate::service::Service for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn state(&self) -> $crate::service::ServiceState {
                self.state
            }

            fn init(&mut self) -> fd_core::error::FdResult<()> {
                self.state = $crate::service::ServiceState::Initializing;
                match self.database.conn() {
                    Ok(_) => {
                        self.state = $crate::service::ServiceState::Running;
                        tracing::debug!(service = $name, "service running");
                        Ok(())
                    }
                    Err(e) => {
                        self.state = $crate::service::ServiceState::Failed;
                        tracing::error!(service = $name, "service failed to start: {e}");
                        Err(e)
                    }
                }
            }

            fn shutdown(&mut self) -> fd_core::error::FdResult<()> {
                self.state = $crate::service::ServiceState::Stopped;
                tracing::debug!(service = $name, "service stopped");
                Ok(())
            }
        }
    };
}

pub(crate) use database_service;

#[cfg(test)]
mod tests {
    use super::*;
    use fd_core::config::DatabaseConfig;
    use fd_models::Database;

    struct Ledger {
        state: ServiceState,
        database: Database,
    }

    database_service!(Ledger, "ledger");

    #[test]
    fn test_database_service_lifecycle() {
        let dir = tempfile::TempDir::new().unwrap();
        let database = Database::init(&dir.path().join("ledger.db"), &DatabaseConfig::default()).unwrap();
        let mut svc = Ledger { state: ServiceState::Created, database };

        assert_eq!(svc.name(), "ledger");
        assert!(!svc.is_healthy());
        svc.init().unwrap();
        assert!(svc.is_healthy());
        svc.shutdown().unwrap();
        assert_eq!(svc.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ServiceState::Initializing.to_string(), "initializing");
        assert_eq!(ServiceState::Failed.to_string(), "failed");
    }
}
