//! FreelanceDesk services: business logic over the account's records.
//!
//! - Entity services for clients, projects, tasks, invoices and contracts
//! - Automation management and the automation dispatcher
//! - Record stores (local SQLite, hosted backend) and action executors
//!   (local outbox, backend edge functions)
//! - Dashboard metrics
//! - Service lifecycle, registry and the intra-service event bus

pub mod service;
pub mod registry;
pub mod event_bus;
pub mod triggers;
pub mod payload;
pub mod store;
pub mod executor;
pub mod dispatcher;
pub mod client;
pub mod project;
pub mod task;
pub mod invoice;
pub mod contract;
pub mod automation;
pub mod dashboard;

pub use service::{Service, ServiceState};
pub use registry::{build_dispatcher, ServiceRegistry};
pub use event_bus::{event_label, AppEvent, EventBus};
pub use triggers::{EntityKind, TriggerDescriptor, TriggerType, TRIGGERS};
pub use payload::build_payload;
pub use store::{LocalStore, RecordStore, RemoteStore};
pub use executor::{ActionExecutor, HttpActionExecutor, OutboxActionExecutor};
pub use dispatcher::{AutomationDispatcher, DispatchOutcome, DispatchReport, DispatchStep};
pub use client::{ClientInput, ClientService};
pub use project::{ProjectDetail, ProjectInput, ProjectService};
pub use task::{TaskInput, TaskService};
pub use invoice::{InvoiceInput, InvoiceService};
pub use contract::{document_filename, ContractInput, ContractService};
pub use automation::{AutomationInput, AutomationService};
pub use dashboard::{DashboardMetrics, DashboardService, StatusTotal};
