//! Project commands.

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use fd_core::config::ConfigHandle;
use fd_core::error::FdResult;
use fd_models::Project;
use fd_services::{EventBus, ProjectInput, ProjectService};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ProjectsAction {
    /// List projects, optionally by status.
    List {
        /// Only projects with this status (planning, active, on_hold, completed, cancelled).
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show a project with its client, tasks and progress.
    Show {
        /// Project id.
        id: String,
    },
    /// Add a project.
    Add {
        name: String,
        /// Client id.
        #[arg(long)]
        client: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        budget: Option<f64>,
        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change a project's status.
    Status {
        /// Project id.
        id: String,
        status: String,
    },
    /// Delete a project and its tasks.
    Delete {
        /// Project id.
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(config: ConfigHandle, action: ProjectsAction, format: OutputFormat) -> FdResult<()> {
    let (db, account) = super::open_account(&config).await?;
    let currency = config.read().await.account.currency.clone();
    let projects = ProjectService::new(db.clone(), EventBus::default());

    match action {
        ProjectsAction::List { status } => {
            let list = projects.list(&account, status.as_deref())?;
            if format == OutputFormat::Json {
                return super::print_json(&list);
            }
            if list.is_empty() {
                println!("No projects found.");
                return Ok(());
            }
            let mut table = super::new_table(vec!["Name", "Status", "Budget", "End", "Id"]);
            for p in &list {
                table.add_row(vec![
                    super::truncate(&p.name, 35),
                    p.status.clone(),
                    p.budget.map(|b| super::format_amount(b, &currency)).unwrap_or_else(|| "-".into()),
                    super::or_dash(p.end_date.as_deref()),
                    super::short_id(&p.id),
                ]);
            }
            println!("{table}");
            println!("\n{} project(s)", list.len());
        }
        ProjectsAction::Show { id } => {
            let id = super::resolve_id(&db, "projects", &account, &id)?;
            let detail = projects.detail(&account, &id)?;
            if format == OutputFormat::Json {
                return super::print_json(&detail);
            }

            let p = &detail.project;
            println!("{}", style(&p.name).bold());
            println!("  Id:        {}", p.id);
            println!("  Status:    {}", p.status);
            println!(
                "  Client:    {}",
                detail.client.as_ref().map(|c| c.label()).unwrap_or_else(|| "-".into())
            );
            if let Some(budget) = p.budget {
                println!("  Budget:    {}", super::format_amount(budget, &currency));
            }
            println!(
                "  Dates:     {} → {}",
                super::or_dash(p.start_date.as_deref()),
                super::or_dash(p.end_date.as_deref())
            );
            if let Some(description) = &p.description {
                println!("  About:     {description}");
            }
            println!(
                "  Progress:  {}% ({}/{} tasks done)",
                detail.progress_percent, detail.tasks_done, detail.tasks_total
            );

            if !detail.tasks.is_empty() {
                println!();
                let mut table = super::new_table(vec!["Task", "Status", "Priority", "Due", "Id"]);
                for t in &detail.tasks {
                    table.add_row(vec![
                        super::truncate(&t.title, 40),
                        t.status.clone(),
                        t.priority.clone(),
                        super::or_dash(t.due_date.as_deref()),
                        super::short_id(&t.id),
                    ]);
                }
                println!("{table}");
            }
        }
        ProjectsAction::Add { name, client, status, budget, start, end, description } => {
            let client = client.map(|id| super::resolve_id(&db, "clients", &account, &id)).transpose()?;
            let project = projects.create(
                &account,
                ProjectInput {
                    name,
                    description,
                    client_id: client,
                    status,
                    budget,
                    start_date: start,
                    end_date: end,
                },
            )?;
            report(&project, format)?;
        }
        ProjectsAction::Status { id, status } => {
            let id = super::resolve_id(&db, "projects", &account, &id)?;
            projects.set_status(&account, &id, &status)?;
            if format == OutputFormat::Json {
                return super::print_json(&projects.get(&account, &id)?);
            }
            println!("Project {} is now {}", super::short_id(&id), style(&status).bold());
        }
        ProjectsAction::Delete { id, yes } => {
            let id = super::resolve_id(&db, "projects", &account, &id)?;
            let project = projects.get(&account, &id)?;
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("Delete project {} and all its tasks?", project.name))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
            if confirmed {
                projects.delete(&account, &id)?;
                println!("{} project {}", style("Deleted").red(), project.name);
            } else {
                println!("Cancelled.");
            }
        }
    }

    Ok(())
}

fn report(project: &Project, format: OutputFormat) -> FdResult<()> {
    match format {
        OutputFormat::Json => super::print_json(project),
        OutputFormat::Text => {
            println!(
                "{} project {} ({}, {})",
                style("Added").green(),
                project.name,
                project.status,
                project.id
            );
            Ok(())
        }
    }
}
