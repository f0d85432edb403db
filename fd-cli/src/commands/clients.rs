//! Client commands.

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use fd_core::config::ConfigHandle;
use fd_core::error::FdResult;
use fd_models::Client;
use fd_services::{ClientInput, ClientService, EventBus};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ClientsAction {
    /// List all clients.
    List,
    /// Show one client and its projects.
    Get {
        /// Client id.
        id: String,
    },
    /// Search clients by name, email or company.
    Search {
        /// Search text.
        query: String,
        /// Maximum number of results.
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,
    },
    /// Add a client.
    Add {
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Replace a client's details.
    Update {
        /// Client id.
        id: String,
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a client.
    Delete {
        /// Client id.
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(config: ConfigHandle, action: ClientsAction, format: OutputFormat) -> FdResult<()> {
    let (db, account) = super::open_account(&config).await?;
    let clients = ClientService::new(db.clone(), EventBus::default());

    match action {
        ClientsAction::List => print_clients(&clients.list(&account)?, format)?,
        ClientsAction::Search { query, limit } => {
            print_clients(&clients.search(&account, &query, limit)?, format)?
        }
        ClientsAction::Get { id } => {
            let id = super::resolve_id(&db, "clients", &account, &id)?;
            let client = clients.get(&account, &id)?;
            let projects = clients.projects(&account, &id)?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "client": client,
                    "projects": projects,
                }))?,
                OutputFormat::Text => {
                    println!("{}", style(client.label()).bold());
                    println!("  Id:       {}", client.id);
                    println!("  Email:    {}", super::or_dash(client.email.as_deref()));
                    println!("  Phone:    {}", super::or_dash(client.phone.as_deref()));
                    println!("  Since:    {}", &client.created_at[..client.created_at.len().min(10)]);
                    if let Some(notes) = &client.notes {
                        println!("  Notes:    {notes}");
                    }
                    println!();
                    if projects.is_empty() {
                        println!("No projects for this client.");
                    } else {
                        let mut table = super::new_table(vec!["Project", "Status", "Id"]);
                        for p in &projects {
                            table.add_row(vec![super::truncate(&p.name, 40), p.status.clone(), super::short_id(&p.id)]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        ClientsAction::Add { name, email, company, phone, notes } => {
            let client = clients.create(&account, ClientInput { name, email, company, phone, notes })?;
            report(&client, "Added", format)?;
        }
        ClientsAction::Update { id, name, email, company, phone, notes } => {
            let id = super::resolve_id(&db, "clients", &account, &id)?;
            let client = clients.update(&account, &id, ClientInput { name, email, company, phone, notes })?;
            report(&client, "Updated", format)?;
        }
        ClientsAction::Delete { id, yes } => {
            let id = super::resolve_id(&db, "clients", &account, &id)?;
            let client = clients.get(&account, &id)?;
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("Delete client {}?", client.name))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
            if confirmed {
                clients.delete(&account, &id)?;
                println!("{} client {}", style("Deleted").red(), client.name);
            } else {
                println!("Cancelled.");
            }
        }
    }

    Ok(())
}

fn report(client: &Client, verb: &str, format: OutputFormat) -> FdResult<()> {
    match format {
        OutputFormat::Json => super::print_json(client),
        OutputFormat::Text => {
            println!("{} client {} ({})", style(verb).green(), client.name, client.id);
            Ok(())
        }
    }
}

fn print_clients(clients: &[Client], format: OutputFormat) -> FdResult<()> {
    if format == OutputFormat::Json {
        return super::print_json(clients);
    }
    if clients.is_empty() {
        println!("No clients found.");
        return Ok(());
    }

    let mut table = super::new_table(vec!["Name", "Email", "Company", "Id"]);
    for c in clients {
        table.add_row(vec![
            super::truncate(&c.name, 30),
            super::or_dash(c.email.as_deref()),
            super::or_dash(c.company.as_deref()),
            super::short_id(&c.id),
        ]);
    }
    println!("{table}");
    println!("\n{} client(s)", clients.len());
    Ok(())
}
