//! Database management commands.

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use fd_core::config::ConfigHandle;
use fd_core::error::FdResult;
use fd_models::migrations;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show row counts, scoped to the account when one is configured.
    Stats,
    /// Run an integrity check.
    Check,
    /// Reset the database (WARNING: destroys all data).
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the database file path.
    Path,
}

pub async fn run(config: ConfigHandle, action: DbAction, format: OutputFormat) -> FdResult<()> {
    let db_path = config.read().await.effective_db_path()?;

    match action {
        DbAction::Stats => {
            let account = config.account_id().await.ok();
            let db = super::init_database(&config).await?;
            let stats = db.stats(account.as_deref())?;

            let file_size = std::fs::metadata(&db_path).ok().map(|m| m.len());
            let conn = db.conn()?;
            let journal_mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_else(|_| "unknown".to_string());
            let schema_version = migrations::get_schema_version(&conn)?;

            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "path": db_path.display().to_string(),
                    "account": account,
                    "tables": stats,
                    "file_size_bytes": file_size,
                    "journal_mode": journal_mode,
                    "schema_version": schema_version,
                }))?,
                OutputFormat::Text => {
                    println!("{}", style("Database Statistics").bold().underlined());
                    println!("  Path:          {}", db_path.display());
                    println!("  Journal mode:  {journal_mode}");
                    println!("  Schema:        v{schema_version}");
                    if let Some(size) = file_size {
                        println!("  Size:          {size} bytes");
                    }
                    match &account {
                        Some(id) => println!("  Scope:         account {id}"),
                        None => println!("  Scope:         all accounts"),
                    }
                    println!();

                    let mut table = super::new_table(vec!["Table", "Row Count"]);
                    for (name, count) in stats.rows() {
                        table.add_row(vec![name.to_string(), count.to_string()]);
                    }
                    println!("{table}");
                }
            }
        }
        DbAction::Check => {
            println!("  {} Running integrity check...", style("...").dim());
            let db = super::init_database(&config).await?;

            match db.run_integrity_check() {
                Ok(()) => println!("  {} Integrity check passed.", style("OK").green().bold()),
                Err(e) => println!("  {} Integrity check failed: {e}", style("FAIL").red().bold()),
            }

            let conn = db.conn()?;
            let violations: i64 = conn
                .query_row("SELECT COUNT(*) FROM pragma_foreign_key_check", [], |row| row.get(0))
                .unwrap_or(0);
            if violations == 0 {
                println!("  {} Foreign key constraints OK.", style("OK").green().bold());
            } else {
                println!(
                    "  {} {violations} foreign key violation(s).",
                    style("WARN").yellow().bold()
                );
            }
        }
        DbAction::Reset { yes } => {
            println!("  {} This will delete ALL local data.", style("WARNING").red().bold());
            println!("  Database: {}", db_path.display());

            let confirmed = yes
                || Confirm::new()
                    .with_prompt("  Are you sure you want to reset the database?")
                    .default(false)
                    .interact()
                    .unwrap_or(false);
            if !confirmed {
                println!("  Reset cancelled.");
                return Ok(());
            }

            let db = super::init_database(&config).await?;
            db.reset()?;
            println!("  {} Database reset complete.", style("OK").green().bold());
        }
        DbAction::Path => match format {
            OutputFormat::Json => super::print_json(&serde_json::json!({ "path": db_path.display().to_string() }))?,
            OutputFormat::Text => println!("{}", db_path.display()),
        },
    }

    Ok(())
}
