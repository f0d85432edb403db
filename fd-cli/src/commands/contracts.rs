//! Contract commands.

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use fd_core::config::ConfigHandle;
use fd_core::error::FdResult;
use fd_services::{document_filename, ContractInput, ContractService, ServiceRegistry};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ContractsAction {
    /// List contracts.
    List,
    /// Show one contract.
    Get {
        /// Contract id.
        id: String,
    },
    /// Add a draft contract.
    Add {
        title: String,
        /// Client id.
        #[arg(long)]
        client: Option<String>,
        /// Project id.
        #[arg(short, long)]
        project: Option<String>,
        #[arg(long)]
        value: Option<f64>,
        /// Contract body text.
        #[arg(long)]
        content: Option<String>,
        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,
    },
    /// Change a contract's status.
    Status {
        /// Contract id.
        id: String,
        status: String,
    },
    /// Email a contract to its client.
    Send {
        /// Contract id.
        id: String,
    },
    /// Delete a contract.
    Delete {
        /// Contract id.
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(config: ConfigHandle, action: ContractsAction, format: OutputFormat) -> FdResult<()> {
    let (registry, account) = super::open_registry(&config).await?;
    let currency = config.read().await.account.currency.clone();
    let result = handle(&registry, &account, &currency, action, format).await;
    registry.shutdown_all().await?;
    result
}

async fn handle(
    registry: &ServiceRegistry,
    account: &str,
    currency: &str,
    action: ContractsAction,
    format: OutputFormat,
) -> FdResult<()> {
    let db = &registry.database;
    let contracts = ContractService::new(db.clone(), registry.event_bus().clone());

    match action {
        ContractsAction::List => {
            let list = contracts.list(account)?;
            if format == OutputFormat::Json {
                return super::print_json(&list);
            }
            if list.is_empty() {
                println!("No contracts found.");
                return Ok(());
            }
            let mut table = super::new_table(vec!["Title", "Status", "Value", "Start", "Id"]);
            for c in &list {
                table.add_row(vec![
                    super::truncate(&c.title, 40),
                    c.status.clone(),
                    c.value.map(|v| super::format_amount(v, currency)).unwrap_or_else(|| "-".into()),
                    super::or_dash(c.start_date.as_deref()),
                    super::short_id(&c.id),
                ]);
            }
            println!("{table}");
        }
        ContractsAction::Get { id } => {
            let id = super::resolve_id(db, "contracts", account, &id)?;
            let contract = contracts.get(account, &id)?;
            let document = document_filename(&contract);
            if format == OutputFormat::Json {
                return super::print_json(&serde_json::json!({
                    "contract": contract,
                    "document": document,
                }));
            }
            println!("{}", style(&contract.title).bold());
            println!("  Id:        {}", contract.id);
            println!("  Status:    {}", contract.status);
            if let Some(value) = contract.value {
                println!("  Value:     {}", super::format_amount(value, currency));
            }
            println!("  Client:    {}", super::or_dash(contract.client_id.as_deref()));
            println!("  Project:   {}", super::or_dash(contract.project_id.as_deref()));
            println!(
                "  Term:      {} → {}",
                super::or_dash(contract.start_date.as_deref()),
                super::or_dash(contract.end_date.as_deref())
            );
            println!("  Document:  {document}");
            if let Some(content) = &contract.content {
                println!();
                println!("{content}");
            }
        }
        ContractsAction::Add { title, client, project, value, content, start, end } => {
            let client = client.map(|id| super::resolve_id(db, "clients", account, &id)).transpose()?;
            let project = project.map(|id| super::resolve_id(db, "projects", account, &id)).transpose()?;
            let contract = contracts.create(
                account,
                ContractInput {
                    title,
                    content,
                    value,
                    client_id: client,
                    project_id: project,
                    start_date: start,
                    end_date: end,
                },
            )?;
            match format {
                OutputFormat::Json => super::print_json(&contract)?,
                OutputFormat::Text => {
                    println!("{} contract {} ({})", style("Added").green(), contract.title, contract.id)
                }
            }
        }
        ContractsAction::Status { id, status } => {
            let id = super::resolve_id(db, "contracts", account, &id)?;
            contracts.set_status(account, &id, &status)?;
            println!("Contract {} is now {}", super::short_id(&id), style(&status).bold());
        }
        ContractsAction::Send { id } => {
            let id = super::resolve_id(db, "contracts", account, &id)?;
            let dispatcher = registry.dispatcher().await?;

            let mut events = registry.event_bus().subscribe();
            let spinner = super::spinner(format!("Sending via {}...", dispatcher.executor().name()));
            let result = contracts.send(dispatcher.executor(), account, &id).await;
            spinner.finish_and_clear();

            let reply = result?;
            match format {
                OutputFormat::Json => super::print_json(&reply)?,
                OutputFormat::Text => {
                    let contract = contracts.get(account, &id)?;
                    println!(
                        "{} {} ({})",
                        style("Sent").green().bold(),
                        document_filename(&contract),
                        contract.status
                    );
                    super::print_events(&mut events);
                }
            }
        }
        ContractsAction::Delete { id, yes } => {
            let id = super::resolve_id(db, "contracts", account, &id)?;
            let contract = contracts.get(account, &id)?;
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("Delete contract {}?", contract.title))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
            if confirmed {
                contracts.delete(account, &id)?;
                println!("{} contract {}", style("Deleted").red(), contract.title);
            } else {
                println!("Cancelled.");
            }
        }
    }

    Ok(())
}
