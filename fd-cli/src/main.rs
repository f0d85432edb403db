//! FreelanceDesk CLI - manage clients, projects, invoices and automations
//! from the terminal.
//!
//! Works against the local SQLite database by default. With a backend
//! configured, automations can read from the hosted backend and send their
//! actions through its edge functions.

mod commands;

use clap::{Parser, Subcommand};
use tracing::info;

use fd_core::config::{AppConfig, ConfigHandle};
use fd_core::error::FdResult;
use fd_core::logging;

/// FreelanceDesk - business management for freelancers and small agencies.
#[derive(Parser)]
#[command(
    name = "freelancedesk",
    version,
    about = "FreelanceDesk business management CLI",
    long_about = "Manage clients, projects, tasks, invoices and contracts, and run\n\
                  automations that email clients about them."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Account to act as (overrides account.user_id).
    #[arg(short, long, global = true)]
    account: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration, backend and local database status.
    Status,
    /// Show business metrics for the account.
    Dashboard,
    /// Manage clients.
    Clients {
        #[command(subcommand)]
        action: commands::clients::ClientsAction,
    },
    /// Manage projects.
    Projects {
        #[command(subcommand)]
        action: commands::projects::ProjectsAction,
    },
    /// Manage project tasks.
    Tasks {
        #[command(subcommand)]
        action: commands::tasks::TasksAction,
    },
    /// Manage invoices.
    Invoices {
        #[command(subcommand)]
        action: commands::invoices::InvoicesAction,
    },
    /// Manage contracts.
    Contracts {
        #[command(subcommand)]
        action: commands::contracts::ContractsAction,
    },
    /// Manage and run automations.
    Automations {
        #[command(subcommand)]
        action: commands::automations::AutomationsAction,
    },
    /// Database management commands.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
}

#[tokio::main]
async fn main() -> FdResult<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from_file(std::path::Path::new(path))?,
        None => AppConfig::load_default()?,
    };
    if let Some(account) = cli.account {
        config.account.user_id = account;
    }

    let log_dir = config.effective_log_dir()?;
    let _guard = logging::init_from_config(&config.logging, &log_dir, cli.verbose)?;

    let config_handle = ConfigHandle::new(config);

    info!("FreelanceDesk CLI v{}", fd_core::constants::APP_VERSION);

    match cli.command {
        Commands::Status => commands::status::run(config_handle, cli.format).await,
        Commands::Dashboard => commands::dashboard::run(config_handle, cli.format).await,
        Commands::Clients { action } => {
            commands::clients::run(config_handle, action, cli.format).await
        }
        Commands::Projects { action } => {
            commands::projects::run(config_handle, action, cli.format).await
        }
        Commands::Tasks { action } => {
            commands::tasks::run(config_handle, action, cli.format).await
        }
        Commands::Invoices { action } => {
            commands::invoices::run(config_handle, action, cli.format).await
        }
        Commands::Contracts { action } => {
            commands::contracts::run(config_handle, action, cli.format).await
        }
        Commands::Automations { action } => {
            commands::automations::run(config_handle, action, cli.format).await
        }
        Commands::Db { action } => commands::db::run(config_handle, action, cli.format).await,
    }
}
