//! CLI subcommands.
//!
//! - `run` - Build and send the report
//! - `preview` - Build the report and write the HTML
//! - `check` - Validate configuration

pub mod check;
pub mod preview;
pub mod run;

use thiserror::Error;

use stock_coverage_report::claude::ClaudeClient;
use stock_coverage_report::odoo::OdooError;
use stock_coverage_report::services::{EmailError, NarrativeService};
use stock_coverage_report::{AppConfig, RunError};

/// Errors that can occur while executing a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The Odoo client could not be built.
    #[error("Odoo client error: {0}")]
    Odoo(#[from] OdooError),

    /// The email service could not be built, or delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// The run aborted.
    #[error("{0}")]
    Run(#[from] RunError),

    /// Writing the preview failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Destination of the preview.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Narrative service for `config`; without a usable Claude client every
/// narrative falls back to the placeholder.
fn narrative_service(config: &AppConfig) -> NarrativeService {
    let client = if config.report.narrative {
        config
            .claude()
            .and_then(|claude| match ClaudeClient::new(claude) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!(error = %e, "Claude client unavailable, narratives will use the placeholder");
                    None
                }
            })
    } else {
        None
    };
    NarrativeService::new(client, config.report.window_days)
}
