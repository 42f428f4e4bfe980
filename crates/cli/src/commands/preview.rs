//! Build the report and write the HTML instead of sending it.

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;

use stock_coverage_report::odoo::OdooClient;
use stock_coverage_report::{AppConfig, ReportJob};

use super::{CommandError, narrative_service};

/// Render the report into `output`, or stdout when `None`.
///
/// # Errors
///
/// Returns an error if the Odoo client cannot be built, the report fails to
/// render, or the output cannot be written.
pub async fn execute(
    config: &AppConfig,
    today: NaiveDate,
    output: Option<&Path>,
) -> Result<(), CommandError> {
    let odoo = OdooClient::new(&config.odoo)?;
    let narrator = narrative_service(config);

    let job = ReportJob::new(&odoo, &narrator, &config.brands, &config.report, &config.pack);
    let Some(report) = job.prepare(today).await? else {
        tracing::info!("No data to preview");
        return Ok(());
    };

    match output {
        Some(path) => {
            std::fs::write(path, &report.html).map_err(|source| CommandError::Write {
                path: path.display().to_string(),
                source,
            })?;
            tracing::info!(path = %path.display(), subject = %report.subject, "Preview written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(report.html.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|source| CommandError::Write {
                    path: "stdout".to_string(),
                    source,
                })?;
        }
    }
    Ok(())
}
