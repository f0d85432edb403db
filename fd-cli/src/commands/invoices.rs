//! Invoice commands.

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use fd_core::config::ConfigHandle;
use fd_core::constants::invoice_status;
use fd_core::dates;
use fd_core::error::FdResult;
use fd_models::Invoice;
use fd_services::{EventBus, InvoiceInput, InvoiceService};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum InvoicesAction {
    /// List invoices, optionally by status.
    List {
        /// draft, sent, paid, overdue or cancelled.
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show one invoice.
    Get {
        /// Invoice id.
        id: String,
    },
    /// Add a draft invoice.
    Add {
        amount: f64,
        /// Invoice number; the next free F-<n> when omitted.
        #[arg(short, long)]
        number: Option<String>,
        /// Client id.
        #[arg(long)]
        client: Option<String>,
        /// Project id.
        #[arg(short, long)]
        project: Option<String>,
        /// Issue date (YYYY-MM-DD), today when omitted.
        #[arg(long)]
        issue: Option<String>,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<String>,
    },
    /// Mark an invoice as sent.
    Send {
        /// Invoice id.
        id: String,
    },
    /// Mark an invoice as paid.
    Pay {
        /// Invoice id.
        id: String,
    },
    /// Mark sent invoices past their due date as overdue.
    Overdue {
        /// Reference date (YYYY-MM-DD), today when omitted.
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete an invoice.
    Delete {
        /// Invoice id.
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(config: ConfigHandle, action: InvoicesAction, format: OutputFormat) -> FdResult<()> {
    let (db, account) = super::open_account(&config).await?;
    let currency = config.read().await.account.currency.clone();
    let invoices = InvoiceService::new(db.clone(), EventBus::default());

    match action {
        InvoicesAction::List { status } => {
            let list = invoices.list(&account, status.as_deref())?;
            if format == OutputFormat::Json {
                return super::print_json(&list);
            }
            if list.is_empty() {
                println!("No invoices found.");
                return Ok(());
            }
            let mut table = super::new_table(vec!["Number", "Amount", "Status", "Issued", "Due", "Id"]);
            let mut total = 0.0;
            for inv in &list {
                total += inv.amount;
                table.add_row(vec![
                    inv.invoice_number.clone(),
                    super::format_amount(inv.amount, &currency),
                    styled_status(&inv.status),
                    super::or_dash(inv.issue_date.as_deref()),
                    super::or_dash(inv.due_date.as_deref()),
                    super::short_id(&inv.id),
                ]);
            }
            println!("{table}");
            println!("\n{} invoice(s), {}", list.len(), super::format_amount(total, &currency));
        }
        InvoicesAction::Get { id } => {
            let id = super::resolve_id(&db, "invoices", &account, &id)?;
            let inv = invoices.get(&account, &id)?;
            match format {
                OutputFormat::Json => super::print_json(&inv)?,
                OutputFormat::Text => print_invoice(&inv, &currency),
            }
        }
        InvoicesAction::Add { amount, number, client, project, issue, due } => {
            let client = client.map(|id| super::resolve_id(&db, "clients", &account, &id)).transpose()?;
            let project = project.map(|id| super::resolve_id(&db, "projects", &account, &id)).transpose()?;
            let inv = invoices.create(
                &account,
                InvoiceInput {
                    invoice_number: number,
                    amount,
                    client_id: client,
                    project_id: project,
                    issue_date: issue,
                    due_date: due,
                },
            )?;
            match format {
                OutputFormat::Json => super::print_json(&inv)?,
                OutputFormat::Text => println!(
                    "{} invoice {} for {}",
                    style("Added").green(),
                    inv.invoice_number,
                    super::format_amount(inv.amount, &currency)
                ),
            }
        }
        InvoicesAction::Send { id } => {
            let id = super::resolve_id(&db, "invoices", &account, &id)?;
            invoices.mark_sent(&account, &id)?;
            show_updated(&invoices, &account, &id, format)?;
        }
        InvoicesAction::Pay { id } => {
            let id = super::resolve_id(&db, "invoices", &account, &id)?;
            invoices.mark_paid(&account, &id)?;
            show_updated(&invoices, &account, &id, format)?;
        }
        InvoicesAction::Overdue { date } => {
            let today = match date {
                Some(d) => dates::parse_date(&d)?,
                None => dates::parse_date(&dates::today())?,
            };
            let marked = invoices.mark_overdue(&account, today)?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "date": today.to_string(),
                    "marked_overdue": marked,
                }))?,
                OutputFormat::Text if marked == 0 => println!("No invoices past due on {today}."),
                OutputFormat::Text => println!(
                    "{} {marked} invoice(s) as overdue",
                    style("Marked").yellow().bold()
                ),
            }
        }
        InvoicesAction::Delete { id, yes } => {
            let id = super::resolve_id(&db, "invoices", &account, &id)?;
            let inv = invoices.get(&account, &id)?;
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("Delete invoice {}?", inv.invoice_number))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
            if confirmed {
                invoices.delete(&account, &id)?;
                println!("{} invoice {}", style("Deleted").red(), inv.invoice_number);
            } else {
                println!("Cancelled.");
            }
        }
    }

    Ok(())
}

fn show_updated(invoices: &InvoiceService, account: &str, id: &str, format: OutputFormat) -> FdResult<()> {
    let inv = invoices.get(account, id)?;
    match format {
        OutputFormat::Json => super::print_json(&inv),
        OutputFormat::Text => {
            println!("Invoice {} is now {}", inv.invoice_number, styled_status(&inv.status));
            Ok(())
        }
    }
}

fn print_invoice(inv: &Invoice, currency: &str) {
    println!("{}", style(format!("Invoice {}", inv.invoice_number)).bold());
    println!("  Id:        {}", inv.id);
    println!("  Amount:    {}", super::format_amount(inv.amount, currency));
    println!("  Status:    {}", styled_status(&inv.status));
    println!("  Client:    {}", super::or_dash(inv.client_id.as_deref()));
    println!("  Project:   {}", super::or_dash(inv.project_id.as_deref()));
    println!("  Issued:    {}", super::or_dash(inv.issue_date.as_deref()));
    println!("  Due:       {}", super::or_dash(inv.due_date.as_deref()));
    if let Some(paid) = &inv.paid_at {
        println!("  Paid at:   {paid}");
    }
}

fn styled_status(status: &str) -> String {
    match status {
        invoice_status::PAID => style(status).green().to_string(),
        invoice_status::OVERDUE => style(status).red().bold().to_string(),
        invoice_status::CANCELLED => style(status).dim().to_string(),
        _ => status.to_string(),
    }
}
