//! CLI command implementations.

pub mod status;
pub mod dashboard;
pub mod clients;
pub mod projects;
pub mod tasks;
pub mod invoices;
pub mod contracts;
pub mod automations;
pub mod db;

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;

use fd_api::ApiClient;
use fd_core::config::ConfigHandle;
use fd_core::error::FdResult;
use fd_models::{Database, User};
use fd_services::{event_label, AppEvent, ServiceRegistry};

/// Open the local database at the configured path.
pub async fn init_database(config: &ConfigHandle) -> FdResult<Database> {
    let cfg = config.read().await;
    let db_path = cfg.effective_db_path()?;
    Database::init(&db_path, &cfg.database)
}

/// Open the database and make sure the configured account has a row in it.
///
/// Returns the database and the account id.
pub async fn open_account(config: &ConfigHandle) -> FdResult<(Database, String)> {
    let account = config.account_id().await?;
    let db = init_database(config).await?;
    {
        let conn = db.conn()?;
        if User::find_by_id(&conn, &account)?.is_none() {
            User::new(&account, &format!("{account}@local")).upsert(&conn)?;
            info!("created local account {account}");
        }
    }
    Ok((db, account))
}

/// Backend client from the `[backend]` section.
pub async fn create_api_client(config: &ConfigHandle) -> FdResult<ApiClient> {
    let backend = config.read().await.backend.clone();
    ApiClient::new(&backend)
}

/// Backend client when one is configured, `None` otherwise.
pub async fn optional_api_client(config: &ConfigHandle) -> FdResult<Option<ApiClient>> {
    if config.read().await.is_backend_configured() {
        create_api_client(config).await.map(Some)
    } else {
        Ok(None)
    }
}

/// Service registry over the account's database, every service running and
/// the backend client attached when one is configured.
///
/// Returns the registry and the account id.
pub async fn open_registry(config: &ConfigHandle) -> FdResult<(ServiceRegistry, String)> {
    let (db, account) = open_account(config).await?;
    let mut registry = ServiceRegistry::new(config.clone(), db);
    registry.register_all();
    if let Some(api) = optional_api_client(config).await? {
        registry.set_api_client(api).await;
    }
    registry.init_all().await?;
    Ok((registry, account))
}

/// Print the events a command caused, as `[Label] description`.
pub fn print_events(events: &mut broadcast::Receiver<AppEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => println!("  {} {event}", style(format!("[{}]", event_label(&event))).cyan()),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                println!("  {} Missed {n} events", style("WARN").yellow())
            }
            Err(_) => break,
        }
    }
}

/// Table with the shared look used by every listing.
pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Steadily ticking spinner for a backend round trip.
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> FdResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format an amount with two decimals and a currency code.
pub fn format_amount(amount: f64, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}

pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// Truncate a string to a maximum number of characters, appending an
/// ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

/// First 8 characters of an id, enough to tell rows apart in a table.
/// [`resolve_id`] turns it back into the full id.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Full id of an account record typed as the full id or a unique prefix.
pub fn resolve_id(db: &Database, table: &str, account: &str, id: &str) -> FdResult<String> {
    let conn = db.conn()?;
    fd_models::queries::resolve_id(&conn, table, account, id)
}
