//! Automation commands: manage automations and run them against records.

use clap::Subcommand;
use console::style;
use dialoguer::Select;
use serde_json::Value;

use fd_core::config::ConfigHandle;
use fd_core::error::{FdError, FdResult};
use fd_models::{Automation, Database, OutboxEntry, RowMap};
use fd_services::{
    AutomationInput, AutomationService, DispatchOutcome, DispatchReport, ServiceRegistry, TriggerType, TRIGGERS,
};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum AutomationsAction {
    /// List automations with their run counters.
    List,
    /// Create an automation.
    Create {
        name: String,
        /// Trigger type (see `automations triggers`).
        trigger: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Create it switched off.
        #[arg(long)]
        inactive: bool,
    },
    /// Switch an automation on or off.
    Toggle {
        /// Automation id.
        id: String,
    },
    /// Delete an automation.
    Delete {
        /// Automation id.
        id: String,
    },
    /// Show the supported trigger types.
    Triggers,
    /// List the records an automation can run against.
    Candidates {
        /// Automation id.
        id: String,
    },
    /// Run an automation against one record.
    Run {
        /// Automation id.
        id: String,
        /// Record id; picked interactively when omitted.
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Show actions queued in the local outbox.
    Outbox {
        /// Number of entries to show.
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,
    },
}

pub async fn run(config: ConfigHandle, action: AutomationsAction, format: OutputFormat) -> FdResult<()> {
    let (registry, account) = super::open_registry(&config).await?;
    let result = handle(&registry, &account, action, format).await;
    registry.shutdown_all().await?;
    result
}

async fn handle(
    registry: &ServiceRegistry,
    account: &str,
    action: AutomationsAction,
    format: OutputFormat,
) -> FdResult<()> {
    let db = &registry.database;
    let automations = AutomationService::new(db.clone(), registry.event_bus().clone());

    match action {
        AutomationsAction::List => {
            let list = automations.list(account)?;
            if format == OutputFormat::Json {
                return super::print_json(&list);
            }
            if list.is_empty() {
                println!("No automations yet. Create one with `automations create`.");
                return Ok(());
            }
            let mut table = super::new_table(vec!["Name", "Trigger", "Active", "Runs", "Last run", "Id"]);
            for a in &list {
                table.add_row(vec![
                    super::truncate(&a.name, 30),
                    a.trigger_type.clone(),
                    if a.is_active { style("yes").green().to_string() } else { style("no").dim().to_string() },
                    a.execution_count.to_string(),
                    super::or_dash(a.last_executed_at.as_deref()),
                    super::short_id(&a.id),
                ]);
            }
            println!("{table}");
        }
        AutomationsAction::Create { name, trigger, description, inactive } => {
            let trigger_type: TriggerType = trigger.parse()?;
            let automation = automations.create(
                account,
                AutomationInput { name, description, trigger_type, inactive },
            )?;
            match format {
                OutputFormat::Json => super::print_json(&automation)?,
                OutputFormat::Text => println!(
                    "{} automation {} ({} → {})",
                    style("Created").green(),
                    automation.name,
                    trigger_type,
                    trigger_type.action()
                ),
            }
        }
        AutomationsAction::Toggle { id } => {
            let id = super::resolve_id(db, "automations", account, &id)?;
            let active = automations.toggle(account, &id)?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({ "id": id, "is_active": active }))?,
                OutputFormat::Text if active => println!("Automation {} {}", super::short_id(&id), style("enabled").green()),
                OutputFormat::Text => println!("Automation {} {}", super::short_id(&id), style("disabled").dim()),
            }
        }
        AutomationsAction::Delete { id } => {
            let id = super::resolve_id(db, "automations", account, &id)?;
            automations.delete(account, &id)?;
            println!("{} automation {}", style("Deleted").red(), super::short_id(&id));
        }
        AutomationsAction::Triggers => {
            if format == OutputFormat::Json {
                let rows: Vec<Value> = TRIGGERS
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "trigger": d.trigger,
                            "entity": d.entity,
                            "table": d.entity.table(),
                            "action": d.action,
                            "label": d.label,
                        })
                    })
                    .collect();
                return super::print_json(&rows);
            }
            let mut table = super::new_table(vec!["Trigger", "Targets", "Action", "Description"]);
            for d in TRIGGERS.iter() {
                table.add_row(vec![
                    d.trigger.to_string(),
                    d.entity.table().to_string(),
                    d.action.to_string(),
                    d.label.to_string(),
                ]);
            }
            println!("{table}");
        }
        AutomationsAction::Candidates { id } => {
            let id = dispatch_id(db, account, id)?;
            let dispatcher = registry.dispatcher().await?;
            let automation = dispatcher.load(account, &id).await?;
            let rows = dispatcher.candidates(&automation).await?;
            if format == OutputFormat::Json {
                return super::print_json(&rows);
            }
            print_candidates(&automation, &rows)?;
        }
        AutomationsAction::Run { id, target } => {
            let id = dispatch_id(db, account, id)?;
            let dispatcher = registry.dispatcher().await?;

            let target = match target {
                Some(target) => target,
                None if format == OutputFormat::Json => {
                    return Err(FdError::Validation("--target is required with json output".into()));
                }
                None => {
                    let automation = dispatcher.load(account, &id).await?;
                    let rows = dispatcher.candidates(&automation).await?;
                    match pick_target(&automation, &rows)? {
                        Some(target) => target,
                        None => {
                            println!("Cancelled.");
                            return Ok(());
                        }
                    }
                }
            };

            let mut events = registry.event_bus().subscribe();
            let spinner = super::spinner(format!("Running automation via {}...", dispatcher.executor().name()));
            let result = automations.run(&dispatcher, account, &id, &target).await;
            spinner.finish_and_clear();
            let report = result?;

            match format {
                OutputFormat::Json => super::print_json(&report)?,
                OutputFormat::Text => {
                    print_report(&report);
                    super::print_events(&mut events);
                }
            }
            if let DispatchOutcome::Failed { step, error } = &report.outcome {
                return Err(FdError::Internal(format!("automation stopped at {step}: {error}")));
            }
        }
        AutomationsAction::Outbox { limit } => {
            let conn = db.conn()?;
            let entries = OutboxEntry::list_for_user(&conn, account, limit)?;
            if format == OutputFormat::Json {
                return super::print_json(&entries);
            }
            if entries.is_empty() {
                println!("Outbox is empty.");
                return Ok(());
            }
            let mut table = super::new_table(vec!["#", "Action", "Queued", "Payload"]);
            for e in &entries {
                table.add_row(vec![
                    e.id.to_string(),
                    e.action.clone(),
                    e.created_at.clone(),
                    super::truncate(&e.payload.to_string(), 60),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}

/// Automation id for the dispatcher. Prefixes resolve against the local
/// database; an id unknown locally is passed through for a remote store.
fn dispatch_id(db: &Database, account: &str, id: String) -> FdResult<String> {
    match super::resolve_id(db, "automations", account, &id) {
        Err(e) if e.is_not_found() => Ok(id),
        resolved => resolved,
    }
}

/// Identifier and display title of a candidate row.
fn candidate_label(row: &RowMap, title_column: &str) -> (String, String) {
    let text = |key: &str| match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    (text("id"), text(title_column))
}

fn print_candidates(automation: &Automation, rows: &[RowMap]) -> FdResult<()> {
    let trigger: TriggerType = automation.trigger_type.parse()?;
    let entity = trigger.entity();
    if rows.is_empty() {
        println!("No {}s to run {} against.", entity.noun(), automation.name);
        return Ok(());
    }

    let mut table = super::new_table(vec!["Id", entity.title_column()]);
    for row in rows {
        let (id, title) = candidate_label(row, entity.title_column());
        table.add_row(vec![id, title]);
    }
    println!("{table}");
    println!("\n{} {}(s)", rows.len(), entity.noun());
    Ok(())
}

fn pick_target(automation: &Automation, rows: &[RowMap]) -> FdResult<Option<String>> {
    let trigger: TriggerType = automation.trigger_type.parse()?;
    let entity = trigger.entity();
    if rows.is_empty() {
        return Err(FdError::Validation(format!(
            "no {}s to run automation {} against",
            entity.noun(),
            automation.name
        )));
    }

    let labeled: Vec<(String, String)> = rows
        .iter()
        .map(|row| candidate_label(row, entity.title_column()))
        .collect();
    let items: Vec<String> = labeled
        .iter()
        .map(|(id, title)| format!("{title}  ({})", super::short_id(id)))
        .collect();

    let choice = Select::new()
        .with_prompt(format!("Run {} against which {}?", automation.name, entity.noun()))
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(|e| FdError::Io(std::io::Error::other(e.to_string())))?;

    Ok(choice.map(|i| labeled[i].0.clone()))
}

fn print_report(report: &DispatchReport) {
    for line in &report.log {
        println!("  {} {line}", style("·").dim());
    }
    match &report.outcome {
        DispatchOutcome::Succeeded { executed_at, execution_count } => println!(
            "{} {} (run #{execution_count} at {executed_at})",
            style("Done").green().bold(),
            report.action.as_deref().unwrap_or("action"),
        ),
        DispatchOutcome::Failed { step, error } => {
            println!("{} at {step}: {error}", style("Failed").red().bold())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_services::EventBus;
    use serde_json::json;

    #[test]
    fn test_candidate_label() {
        let row = json!({ "id": "i1", "invoice_number": "F-12", "amount": 120.0 });
        let row = row.as_object().unwrap();
        assert_eq!(candidate_label(row, "invoice_number"), ("i1".to_string(), "F-12".to_string()));
        assert_eq!(candidate_label(row, "amount"), ("i1".to_string(), "120.0".to_string()));
        assert_eq!(candidate_label(row, "name"), ("i1".to_string(), String::new()));
    }

    #[test]
    fn test_listed_short_id_toggles_automation() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("fd.db"), &Default::default()).unwrap();
        fd_models::User::new("u1", "u1@local").upsert(&db.conn().unwrap()).unwrap();
        let automations = AutomationService::new(db.clone(), EventBus::default());
        let automation = automations
            .create(
                "u1",
                AutomationInput {
                    name: "Chase invoices".into(),
                    description: None,
                    trigger_type: TriggerType::InvoiceOverdue,
                    inactive: false,
                },
            )
            .unwrap();

        let listed = super::super::short_id(&automation.id);
        let id = super::super::resolve_id(&db, "automations", "u1", &listed).unwrap();
        assert_eq!(id, automation.id);
        assert!(!automations.toggle("u1", &id).unwrap());

        assert_eq!(dispatch_id(&db, "u1", listed).unwrap(), automation.id);
        assert_eq!(dispatch_id(&db, "u1", "remote-only".into()).unwrap(), "remote-only");
    }
}
