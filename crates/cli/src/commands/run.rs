//! Build the report and email it.

use chrono::NaiveDate;

use stock_coverage_report::odoo::OdooClient;
use stock_coverage_report::services::EmailService;
use stock_coverage_report::{AppConfig, ReportJob, RunOutcome};

use super::{CommandError, narrative_service};

/// Run every configured brand and send the report.
///
/// # Errors
///
/// Returns an error if a client cannot be built, the report fails to render,
/// or delivery fails.
pub async fn execute(config: &AppConfig, today: NaiveDate) -> Result<(), CommandError> {
    let odoo = OdooClient::new(&config.odoo)?;
    let mailer = EmailService::new(&config.email)?;
    let narrator = narrative_service(config);

    let job = ReportJob::new(&odoo, &narrator, &config.brands, &config.report, &config.pack);
    match job.run(&mailer, today).await? {
        RunOutcome::Sent { sections } => {
            tracing::info!(sections, recipients = config.email.recipients.len(), "Report sent");
            Ok(())
        }
        RunOutcome::NothingToSend => {
            tracing::info!("No data to send");
            Ok(())
        }
        RunOutcome::SendFailed(e) => Err(CommandError::Email(e)),
    }
}
