//! Validate configuration without touching the ERP or the mail server.

use stock_coverage_report::AppConfig;
use stock_coverage_report::odoo::OdooClient;
use stock_coverage_report::services::EmailService;

use super::CommandError;

/// Build every client from `config` and log what a run would do.
///
/// # Errors
///
/// Returns an error if the Odoo endpoint or an email address is unusable.
pub fn execute(config: &AppConfig) -> Result<(), CommandError> {
    OdooClient::new(&config.odoo)?;
    EmailService::new(&config.email)?;

    let brands: Vec<&str> = config.brands.iter().map(|b| b.name.as_str()).collect();
    tracing::info!(
        brands = ?brands,
        composite = ?config.pack.brands,
        window_days = config.report.window_days.days(),
        top_n = ?config.report.top_n,
        narrative = config.report.narrative,
        claude = config.claude().is_some(),
        recipients = config.email.recipients.len(),
        "Configuration is valid"
    );
    Ok(())
}
