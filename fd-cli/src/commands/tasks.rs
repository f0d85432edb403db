//! Task commands.

use clap::Subcommand;
use console::style;

use fd_core::config::ConfigHandle;
use fd_core::error::FdResult;
use fd_services::{EventBus, TaskInput, TaskService};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum TasksAction {
    /// List tasks across projects, or for one project.
    List {
        /// Project id.
        #[arg(short, long)]
        project: Option<String>,
        /// Only tasks with this status (todo, in_progress, done).
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Add a task to a project.
    Add {
        /// Project id.
        project: String,
        title: String,
        /// low, medium or high.
        #[arg(short, long)]
        priority: Option<String>,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change a task's status.
    Status {
        /// Task id.
        id: String,
        status: String,
    },
    /// Delete a task.
    Delete {
        /// Task id.
        id: String,
    },
}

pub async fn run(config: ConfigHandle, action: TasksAction, format: OutputFormat) -> FdResult<()> {
    let (db, account) = super::open_account(&config).await?;
    let tasks = TaskService::new(db.clone(), EventBus::default());

    match action {
        TasksAction::List { project, status } => {
            let project = project.map(|id| super::resolve_id(&db, "projects", &account, &id)).transpose()?;
            let mut list = match &project {
                Some(project_id) => tasks.list_for_project(&account, project_id)?,
                None => tasks.list(&account, status.as_deref())?,
            };
            if project.is_some() {
                if let Some(status) = &status {
                    list.retain(|t| &t.status == status);
                }
            }

            if format == OutputFormat::Json {
                return super::print_json(&list);
            }
            if list.is_empty() {
                println!("No tasks found.");
                return Ok(());
            }
            let mut table = super::new_table(vec!["Title", "Status", "Priority", "Due", "Project", "Id"]);
            for t in &list {
                let status = if t.is_done() {
                    style(t.status.clone()).green().to_string()
                } else {
                    t.status.clone()
                };
                table.add_row(vec![
                    super::truncate(&t.title, 40),
                    status,
                    t.priority.clone(),
                    super::or_dash(t.due_date.as_deref()),
                    super::short_id(&t.project_id),
                    super::short_id(&t.id),
                ]);
            }
            println!("{table}");
            println!("\n{} task(s)", list.len());
        }
        TasksAction::Add { project, title, priority, due, description } => {
            let project = super::resolve_id(&db, "projects", &account, &project)?;
            let task = tasks.create(
                &account,
                TaskInput {
                    project_id: project,
                    title,
                    description,
                    priority,
                    due_date: due,
                },
            )?;
            match format {
                OutputFormat::Json => super::print_json(&task)?,
                OutputFormat::Text => println!("{} task {} ({})", style("Added").green(), task.title, task.id),
            }
        }
        TasksAction::Status { id, status } => {
            let id = super::resolve_id(&db, "tasks", &account, &id)?;
            tasks.set_status(&account, &id, &status)?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({ "id": id, "status": status }))?,
                OutputFormat::Text => println!("Task {} is now {}", super::short_id(&id), style(&status).bold()),
            }
        }
        TasksAction::Delete { id } => {
            let id = super::resolve_id(&db, "tasks", &account, &id)?;
            tasks.delete(&account, &id)?;
            println!("{} task {}", style("Deleted").red(), super::short_id(&id));
        }
    }

    Ok(())
}
