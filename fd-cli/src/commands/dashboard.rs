//! Dashboard command.

use console::style;

use fd_core::config::ConfigHandle;
use fd_core::error::FdResult;
use fd_services::DashboardService;
use crate::OutputFormat;

pub async fn run(config: ConfigHandle, format: OutputFormat) -> FdResult<()> {
    let (db, account) = super::open_account(&config).await?;
    let currency = config.read().await.account.currency.clone();
    let metrics = DashboardService::new(db).metrics(&account)?;

    if format == OutputFormat::Json {
        return super::print_json(&metrics);
    }

    let money = |amount: f64| super::format_amount(amount, &currency);

    println!("{}", style("Overview").bold().underlined());
    println!("  Clients:            {}", metrics.clients);
    println!("  Active projects:    {}", metrics.active_projects);
    println!("  Open tasks:         {}", metrics.open_tasks);
    println!("  Revenue:            {}", style(money(metrics.revenue)).green());
    println!("  Outstanding:        {}", money(metrics.outstanding));
    if metrics.overdue_invoices > 0 {
        println!("  Overdue invoices:   {}", style(metrics.overdue_invoices).red().bold());
    } else {
        println!("  Overdue invoices:   0");
    }
    println!(
        "  Automations:        {} active, {} runs",
        metrics.active_automations, metrics.automation_runs
    );

    if !metrics.revenue_by_month.is_empty() {
        println!();
        println!("{}", style("Revenue by month").bold().underlined());
        let mut table = super::new_table(vec!["Month", "Paid"]);
        for (month, amount) in &metrics.revenue_by_month {
            table.add_row(vec![month.clone(), money(*amount)]);
        }
        println!("{table}");
    }

    if !metrics.invoices_by_status.is_empty() {
        println!();
        println!("{}", style("Invoices by status").bold().underlined());
        let mut table = super::new_table(vec!["Status", "Count", "Amount"]);
        for (status, total) in &metrics.invoices_by_status {
            table.add_row(vec![status.clone(), total.count.to_string(), money(total.amount)]);
        }
        println!("{table}");
    }

    Ok(())
}
