//! Integration tests for the entity services.
//!
//! Tests EventBus publish/subscribe, client/project/task/invoice/contract
//! operations against a seeded database, dashboard aggregates, and
//! ServiceRegistry initialization.

mod common;

use chrono::NaiveDate;

use common::{create_test_db, create_test_event_bus, seed_test_data, ACCOUNT, OTHER_ACCOUNT};
use fd_core::error::FdError;
use fd_models::OutboxEntry;
use fd_services::event_bus::AppEvent;
use fd_services::executor::OutboxActionExecutor;
use fd_services::registry::ServiceRegistry;
use fd_services::service::Service;
use fd_services::triggers::TriggerType;
use fd_services::{
    AutomationInput, AutomationService, ClientInput, ClientService, ContractService, DashboardService,
    InvoiceInput, InvoiceService, ProjectInput, ProjectService, TaskInput, TaskService,
};

// ---- EventBus publish/subscribe ----

#[tokio::test]
async fn event_bus_multiple_subscribers_all_receive() {
    let bus = create_test_event_bus();
    let mut rx1 = bus.subscribe();
    let mut rx2 = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    bus.emit(AppEvent::InvoicesMarkedOverdue { count: 3 });

    assert_eq!(rx1.recv().await.unwrap(), AppEvent::InvoicesMarkedOverdue { count: 3 });
    assert_eq!(rx2.recv().await.unwrap(), AppEvent::InvoicesMarkedOverdue { count: 3 });
}

#[test]
fn event_bus_emit_without_subscribers_does_not_panic() {
    let bus = create_test_event_bus();
    bus.emit(AppEvent::RecordDeleted { entity: "client", id: "1".into() });
    assert_eq!(bus.subscriber_count(), 0);
}

// ---- Clients ----

#[tokio::test]
async fn client_create_update_delete_emits_events() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let bus = create_test_event_bus();
    let mut rx = bus.subscribe();
    let clients = ClientService::new(db.clone(), bus);

    let created = clients
        .create(
            ACCOUNT,
            ClientInput {
                name: "  Umbrella  ".into(),
                email: Some("ops@umbrella.test".into()),
                phone: Some("   ".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(created.name, "Umbrella");
    assert_eq!(created.phone, None);

    let updated = clients
        .update(
            ACCOUNT,
            &created.id,
            ClientInput {
                name: "Umbrella Corp".into(),
                company: Some("Umbrella".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Umbrella Corp");
    assert_eq!(updated.email, None);

    clients.delete(ACCOUNT, &created.id).unwrap();
    assert!(clients.get(ACCOUNT, &created.id).unwrap_err().is_not_found());

    let kinds: Vec<_> = (0..3)
        .map(|_| rx.try_recv().unwrap())
        .map(|e| fd_services::event_label(&e))
        .collect();
    assert_eq!(kinds, vec!["RecordCreated", "RecordUpdated", "RecordDeleted"]);
}

#[test]
fn client_list_and_search_are_scoped_to_account() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let clients = ClientService::new(db, create_test_event_bus());

    let names: Vec<_> = clients.list(ACCOUNT).unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Acme", "Globex"]);

    assert_eq!(clients.search(ACCOUNT, "acme.com", 10).unwrap().len(), 1);
    assert!(clients.search(ACCOUNT, "Initech", 10).unwrap().is_empty());
    assert!(clients.get(ACCOUNT, "9").unwrap_err().is_not_found());
    assert_eq!(clients.get(OTHER_ACCOUNT, "9").unwrap().name, "Initech");
}

#[test]
fn client_projects_lists_linked_projects() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let clients = ClientService::new(db, create_test_event_bus());

    let projects = clients.projects(ACCOUNT, "1").unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, "p1");
}

// ---- Projects and tasks ----

#[test]
fn project_detail_reports_task_progress() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let projects = ProjectService::new(db, create_test_event_bus());

    let detail = projects.detail(ACCOUNT, "p1").unwrap();
    assert_eq!(detail.project.name, "Website");
    assert_eq!(detail.client.as_ref().map(|c| c.name.as_str()), Some("Acme"));
    assert_eq!(detail.tasks.len(), 4);
    assert_eq!((detail.tasks_done, detail.tasks_total), (2, 4));
    assert_eq!(detail.progress_percent, 50);

    let empty = projects.detail(ACCOUNT, "p2").unwrap();
    assert!(empty.client.is_none());
    assert_eq!(empty.progress_percent, 0);
}

#[test]
fn project_create_rejects_foreign_client() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let projects = ProjectService::new(db, create_test_event_bus());

    let err = projects
        .create(
            ACCOUNT,
            ProjectInput {
                name: "Stolen".into(),
                client_id: Some("9".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(err.is_not_found());

    let created = projects
        .create(
            ACCOUNT,
            ProjectInput {
                name: "Brand refresh".into(),
                client_id: Some("2".into()),
                status: Some("active".into()),
                budget: Some(1200.0),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(projects.list(ACCOUNT, Some("active")).unwrap().len(), 2);
    projects.set_status(ACCOUNT, &created.id, "completed").unwrap();
    assert_eq!(projects.get(ACCOUNT, &created.id).unwrap().status, "completed");
}

#[test]
fn project_set_status_rejects_unknown_status() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let projects = ProjectService::new(db, create_test_event_bus());

    let err = projects.set_status(ACCOUNT, "p1", "paused").unwrap_err();
    assert!(matches!(err, FdError::Validation(_)));
}

#[test]
fn task_lifecycle() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let tasks = TaskService::new(db.clone(), create_test_event_bus());

    let task = tasks
        .create(
            ACCOUNT,
            TaskInput {
                project_id: "p2".into(),
                title: "Monthly report".into(),
                priority: Some("high".into()),
                due_date: Some("2024-07-01".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(task.status, "todo");
    assert_eq!(tasks.list_for_project(ACCOUNT, "p2").unwrap().len(), 1);

    tasks.set_status(ACCOUNT, &task.id, "done").unwrap();
    assert_eq!(tasks.list(ACCOUNT, Some("done")).unwrap().len(), 3);
    assert_eq!(tasks.list(ACCOUNT, Some("todo")).unwrap().len(), 1);

    tasks.delete(ACCOUNT, &task.id).unwrap();
    assert!(tasks.delete(ACCOUNT, &task.id).unwrap_err().is_not_found());

    let err = tasks
        .create(
            ACCOUNT,
            TaskInput {
                project_id: "missing".into(),
                title: "Orphan".into(),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(err.is_not_found());
}

// ---- Invoices ----

#[test]
fn invoice_numbering_and_payment() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let invoices = InvoiceService::new(db, create_test_event_bus());

    // Four invoices exist and F-5 through F-8 are taken.
    let invoice = invoices
        .create(
            ACCOUNT,
            InvoiceInput {
                amount: 450.0,
                client_id: Some("1".into()),
                due_date: Some("2024-08-01".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(invoice.invoice_number, "F-9");
    assert_eq!(invoice.status, "draft");
    assert!(invoice.issue_date.is_some());

    invoices.mark_sent(ACCOUNT, &invoice.id).unwrap();
    invoices.mark_paid(ACCOUNT, &invoice.id).unwrap();
    let paid = invoices.get(ACCOUNT, &invoice.id).unwrap();
    assert_eq!(paid.status, "paid");
    assert!(paid.paid_at.is_some());

    let explicit = invoices
        .create(
            ACCOUNT,
            InvoiceInput {
                invoice_number: Some("2024-001".into()),
                amount: 10.0,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(explicit.invoice_number, "2024-001");
}

#[test]
fn invoice_rejects_negative_amount() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let invoices = InvoiceService::new(db, create_test_event_bus());

    let err = invoices
        .create(ACCOUNT, InvoiceInput { amount: -1.0, ..Default::default() })
        .unwrap_err();
    assert!(matches!(err, FdError::Validation(_)));
}

#[tokio::test]
async fn invoice_mark_overdue_flags_sent_past_due() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let bus = create_test_event_bus();
    let mut rx = bus.subscribe();
    let invoices = InvoiceService::new(db, bus);

    let before_due = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    assert_eq!(invoices.mark_overdue(ACCOUNT, before_due).unwrap(), 0);

    let after_due = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
    assert_eq!(invoices.mark_overdue(ACCOUNT, after_due).unwrap(), 1);
    assert_eq!(invoices.get(ACCOUNT, "5").unwrap().status, "overdue");
    assert_eq!(rx.recv().await.unwrap(), AppEvent::InvoicesMarkedOverdue { count: 1 });

    // Already overdue: nothing left to flag.
    assert_eq!(invoices.mark_overdue(ACCOUNT, after_due).unwrap(), 0);
}

// ---- Contracts ----

#[tokio::test]
async fn contract_send_queues_email_and_marks_sent() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let bus = create_test_event_bus();
    let mut rx = bus.subscribe();
    let contracts = ContractService::new(db.clone(), bus);
    let executor = OutboxActionExecutor::new(db.clone());

    let reply = contracts.send(&executor, ACCOUNT, "c1").await.unwrap();
    assert!(reply["outboxId"].as_i64().is_some());
    assert_eq!(contracts.get(ACCOUNT, "c1").unwrap().status, "sent");

    let outbox = OutboxEntry::list_for_user(&db.conn().unwrap(), ACCOUNT, 10).unwrap();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].action, "send_contract_email");
    let payload = &outbox[0].payload;
    assert_eq!(payload["contractTitle"], "Website Redesign");
    assert_eq!(payload["contractValue"].as_f64(), Some(5000.0));
    assert_eq!(payload["clientEmail"], "a@acme.com");
    assert_eq!(payload["documentName"], "contrato-website-redesign-c1.pdf");

    match rx.recv().await.unwrap() {
        AppEvent::ContractSent { contract_id, document_name } => {
            assert_eq!(contract_id, "c1");
            assert_eq!(document_name, "contrato-website-redesign-c1.pdf");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn contract_send_keeps_signed_status() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let contracts = ContractService::new(db.clone(), create_test_event_bus());
    contracts.set_status(ACCOUNT, "c1", "signed").unwrap();

    contracts
        .send(&OutboxActionExecutor::new(db), ACCOUNT, "c1")
        .await
        .unwrap();
    assert_eq!(contracts.get(ACCOUNT, "c1").unwrap().status, "signed");
}

// ---- Automations ----

#[test]
fn automation_create_toggle_delete() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let automations = AutomationService::new(db, create_test_event_bus());

    let created = automations
        .create(
            ACCOUNT,
            AutomationInput {
                name: "Overdue notice".into(),
                description: None,
                trigger_type: TriggerType::InvoiceOverdue,
                inactive: false,
            },
        )
        .unwrap();
    assert_eq!(created.trigger_type, "invoice_overdue");
    assert!(created.is_active);

    assert!(!automations.toggle(ACCOUNT, &created.id).unwrap());
    assert!(automations.toggle(ACCOUNT, &created.id).unwrap());

    // Active automations come first.
    let listed = automations.list(ACCOUNT).unwrap();
    assert_eq!(listed.len(), 5);
    assert!(!listed.last().unwrap().is_active);

    automations.delete(ACCOUNT, &created.id).unwrap();
    assert!(automations.get(ACCOUNT, &created.id).unwrap_err().is_not_found());
}

// ---- Dashboard ----

#[test]
fn dashboard_metrics_match_seeded_data() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let dashboard = DashboardService::new(db);

    let metrics = dashboard.metrics(ACCOUNT).unwrap();
    assert_eq!(metrics.clients, 2);
    assert_eq!(metrics.active_projects, 1);
    assert_eq!(metrics.open_tasks, 2);
    assert_eq!(metrics.revenue, 380.0);
    assert_eq!(metrics.outstanding, 120.0);
    assert_eq!(metrics.overdue_invoices, 0);
    assert_eq!(metrics.revenue_by_month.len(), 2);
    assert_eq!(metrics.revenue_by_month["2024-03"], 300.0);
    assert_eq!(metrics.revenue_by_month["2024-04"], 80.0);
    assert_eq!(metrics.invoices_by_status["paid"].count, 2);
    assert_eq!(metrics.invoices_by_status["draft"].amount, 50.0);
    assert_eq!(metrics.active_automations, 3);
    assert_eq!(metrics.automation_runs, 0);

    let other = dashboard.metrics(OTHER_ACCOUNT).unwrap();
    assert_eq!(other.revenue, 999.0);
    assert_eq!(other.clients, 1);
}

// ---- Registry ----

#[tokio::test]
async fn registry_initializes_every_service() {
    let (db, _dir) = create_test_db();
    let mut registry = ServiceRegistry::new(common::create_test_config_handle(), db);
    registry.register_all();
    registry.init_all().await.unwrap();

    let health = registry.health_check().await;
    let names: Vec<_> = health.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec!["clients", "projects", "tasks", "invoices", "contracts", "automations", "dashboard"]
    );
    assert!(health.iter().all(|(_, _, healthy)| *healthy));

    registry.shutdown_all().await.unwrap();
}

#[test]
fn database_service_lifecycle() {
    let (db, _dir) = create_test_db();
    let mut service = ClientService::new(db, create_test_event_bus());
    assert!(!service.is_healthy());
    service.init().unwrap();
    assert!(service.is_healthy());
    service.shutdown().unwrap();
    assert!(!service.is_healthy());
    assert_eq!(service.name(), "clients");
}

#[tokio::test]
async fn dispatcher_built_from_registry_runs_seeded_automation() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let registry = ServiceRegistry::new(common::create_test_config_handle(), db.clone());
    let dispatcher = registry.dispatcher().await.unwrap();
    let automations = AutomationService::new(db, registry.event_bus().clone());

    let report = automations.run(&dispatcher, ACCOUNT, "a1", "2").await.unwrap();
    assert!(report.succeeded());
    let payload = report.payload.unwrap();
    assert_eq!(payload["clientName"], "Globex");
    assert!(payload["clientEmail"].is_null());
}
