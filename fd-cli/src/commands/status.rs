//! Status command - show configuration, backend and local database status.

use console::style;
use serde_json::json;

use fd_core::config::ConfigHandle;
use fd_core::error::FdResult;
use fd_models::User;
use crate::OutputFormat;

pub async fn run(config: ConfigHandle, format: OutputFormat) -> FdResult<()> {
    let cfg = config.read().await.clone();
    let account = cfg.require_account().ok().map(str::to_string);
    let db_path = cfg.effective_db_path()?;

    // Backend reachability: resolve the token's account.
    let mut backend_user = None;
    let mut backend_error = None;
    let mut latency_ms = None;
    if cfg.is_backend_configured() {
        let api = super::create_api_client(&config).await?;
        let start = std::time::Instant::now();
        match api.current_user().await {
            Ok(user) => backend_user = Some(user),
            Err(e) => backend_error = Some(e.to_string()),
        }
        latency_ms = Some(start.elapsed().as_millis() as u64);
    }

    let db = super::init_database(&config).await?;
    if let (Some(user), Some(account)) = (&backend_user, &account) {
        if &user.id == account {
            if let Some(email) = &user.email {
                let conn = db.conn()?;
                User::new(&user.id, email).upsert(&conn)?;
            }
        }
    }
    let stats = db.stats(account.as_deref())?;

    match format {
        OutputFormat::Json => {
            super::print_json(&json!({
                "account": account,
                "currency": cfg.account.currency,
                "store": cfg.automation.store,
                "executor": cfg.automation.executor,
                "backend": {
                    "url": cfg.backend.url,
                    "configured": cfg.is_backend_configured(),
                    "user": backend_user,
                    "error": backend_error,
                    "latency_ms": latency_ms,
                },
                "local_database": {
                    "path": db_path.display().to_string(),
                    "rows": stats,
                },
            }))?;
        }
        OutputFormat::Text => {
            println!("{}", style("Account").bold().underlined());
            match &account {
                Some(id) => println!("  Id:            {id}"),
                None => println!("  Id:            {}", style("not set (account.user_id)").yellow()),
            }
            println!("  Currency:      {}", cfg.account.currency);
            println!();

            println!("{}", style("Backend").bold().underlined());
            if !cfg.is_backend_configured() {
                println!("  {}", style("not configured, running local only").dim());
            } else {
                println!("  URL:           {}", cfg.backend.url);
                match (&backend_user, &backend_error) {
                    (Some(user), _) => println!(
                        "  Status:        {} as {} ({} ms)",
                        style("connected").green(),
                        super::or_dash(user.email.as_deref()),
                        latency_ms.unwrap_or(0)
                    ),
                    (None, Some(err)) => println!("  Status:        {} {err}", style("unreachable").red()),
                    (None, None) => {}
                }
            }
            println!();

            println!("{}", style("Automations").bold().underlined());
            println!("  Store:         {:?}", cfg.automation.store);
            println!("  Executor:      {:?}", cfg.automation.executor);
            println!("  Candidates:    up to {}", cfg.automation.candidate_limit);
            println!();

            println!("{}", style("Local database").bold().underlined());
            println!("  Path:          {}", db_path.display());
            println!("  Rows:          {stats}");
        }
    }

    Ok(())
}
