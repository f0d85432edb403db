//! Service registry.
//!
//! Holds the shared infrastructure (config, database, API
//! client, event bus) and every service, initializes services in order and
//! shuts them down in reverse. It also assembles the automation dispatcher
//! from the configured store and executor modes.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use fd_api::ApiClient;
use fd_core::config::{AutomationConfig, ConfigHandle, ExecutorMode, StoreMode};
use fd_core::error::{FdError, FdResult};
use fd_models::Database;

use crate::automation::AutomationService;
use crate::client::ClientService;
use crate::contract::ContractService;
use crate::dashboard::DashboardService;
use crate::dispatcher::AutomationDispatcher;
use crate::event_bus::EventBus;
use crate::executor::{ActionExecutor, HttpActionExecutor, OutboxActionExecutor};
use crate::invoice::InvoiceService;
use crate::project::ProjectService;
use crate::service::{Service, ServiceState};
use crate::store::{LocalStore, RecordStore, RemoteStore};
use crate::task::TaskService;

/// Shared infrastructure plus every registered service.
pub struct ServiceRegistry {
    pub config: ConfigHandle,
    pub database: Database,
    /// Backend client, once a backend is configured.
    pub api_client: Arc<RwLock<Option<ApiClient>>>,
    pub event_bus: EventBus,
    /// In registration order, which is also init order.
    services: Vec<(String, Arc<RwLock<Box<dyn Service>>>)>,
}

impl ServiceRegistry {
    pub fn new(config: ConfigHandle, database: Database) -> Self {
        Self {
            config,
            database,
            api_client: Arc::new(RwLock::new(None)),
            event_bus: EventBus::default(),
            services: Vec::new(),
        }
    }

    pub fn register<S: Service + 'static>(&mut self, service: S) {
        let name = service.name().to_string();
        debug!(service = %name, "registered");
        let service: Box<dyn Service> = Box::new(service);
        self.services.push((name, Arc::new(RwLock::new(service))));
    }

    /// Register the entity services and the dashboard.
    ///
    /// Clients come first since projects, invoices and contracts link to
    /// them; the dashboard reads everything and goes last.
    pub fn register_all(&mut self) {
        let bus = self.event_bus.clone();

        self.register(ClientService::new(self.database.clone(), bus.clone()));
        self.register(ProjectService::new(self.database.clone(), bus.clone()));
        self.register(TaskService::new(self.database.clone(), bus.clone()));
        self.register(InvoiceService::new(self.database.clone(), bus.clone()));
        self.register(ContractService::new(self.database.clone(), bus.clone()));
        self.register(AutomationService::new(self.database.clone(), bus));
        self.register(DashboardService::new(self.database.clone()));

        debug!(count = self.services.len(), "services registered");
    }

    /// Init every service in registration order, stopping at the first failure.
    pub async fn init_all(&self) -> FdResult<()> {
        for (name, service) in &self.services {
            service
                .write()
                .await
                .init()
                .map_err(|e| FdError::ServiceInit(format!("{name}: {e}")))?;
        }
        info!(count = self.services.len(), "services running");
        Ok(())
    }

    /// Shut services down in reverse order. Failures are logged, not returned.
    pub async fn shutdown_all(&self) -> FdResult<()> {
        for (name, service) in self.services.iter().rev() {
            if let Err(e) = service.write().await.shutdown() {
                error!(service = %name, "shutdown failed: {e}");
            }
        }
        info!("services stopped");
        Ok(())
    }

    pub async fn set_api_client(&self, client: ApiClient) {
        *self.api_client.write().await = Some(client);
        debug!("backend client set");
    }

    pub async fn api_client(&self) -> FdResult<ApiClient> {
        self.api_client
            .read()
            .await
            .clone()
            .ok_or_else(|| FdError::ServiceNotInitialized("backend client not configured".into()))
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Dispatcher wired according to the current automation config.
    pub async fn dispatcher(&self) -> FdResult<AutomationDispatcher> {
        let automation = self.config.read().await.automation.clone();
        let api = self.api_client.read().await.clone();
        build_dispatcher(&automation, &self.database, api, self.event_bus.clone())
    }

    /// `(name, state, healthy)` for every service.
    pub async fn health_check(&self) -> Vec<(String, ServiceState, bool)> {
        let mut report = Vec::with_capacity(self.services.len());
        for (name, service) in &self.services {
            let svc = service.read().await;
            report.push((name.clone(), svc.state(), svc.is_healthy()));
        }
        report
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

/// Assemble a dispatcher from the configured store and executor modes.
///
/// Remote store and HTTP executor both need `api`; asking for either
/// without one is a configuration error.
pub fn build_dispatcher(
    config: &AutomationConfig,
    database: &Database,
    api: Option<ApiClient>,
    event_bus: EventBus,
) -> FdResult<AutomationDispatcher> {
    let require_api = |what: &str| {
        api.clone().ok_or_else(|| {
            FdError::MissingConfig(format!("backend url and api key are required for {what}"))
        })
    };

    let store: Arc<dyn RecordStore> = match config.store {
        StoreMode::Local => Arc::new(LocalStore::new(database.clone())),
        StoreMode::Remote => Arc::new(RemoteStore::new(require_api("the remote store")?)),
    };
    let executor: Arc<dyn ActionExecutor> = match config.executor {
        ExecutorMode::Outbox => Arc::new(OutboxActionExecutor::new(database.clone())),
        ExecutorMode::Http => Arc::new(HttpActionExecutor::new(require_api("the http executor")?)),
    };

    info!(store = store.name(), executor = executor.name(), "automation dispatcher ready");
    Ok(AutomationDispatcher::new(store, executor, event_bus).with_candidate_limit(config.candidate_limit))
}
