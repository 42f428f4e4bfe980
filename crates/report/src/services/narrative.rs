//! Narrative summaries of a brand's coverage rows.

use std::future::Future;

use askama::Template;
use thiserror::Error;
use tracing::{info, instrument, warn};

use stock_coverage_core::{Coverage, CoverageRow, SalesWindow};

use crate::claude::{ClaudeClient, ClaudeError};

/// Inserted in place of the summary when none can be generated.
pub const NARRATIVE_PLACEHOLDER: &str = "Narrative summary unavailable.";

/// Errors that can occur when generating a narrative.
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// No API key was configured.
    #[error("no CLAUDE_API_KEY configured")]
    MissingCredential,

    /// The completion request failed.
    #[error("Claude error: {0}")]
    Claude(#[from] ClaudeError),

    /// The prompt template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Produces a short natural-language summary of one brand's rows.
pub trait Narrator {
    /// Summarize `rows` for `brand`.
    fn summarize(
        &self,
        brand: &str,
        rows: &[CoverageRow],
    ) -> impl Future<Output = Result<String, NarrativeError>>;
}

#[derive(Template)]
#[template(path = "claude/narrative_prompt.txt")]
struct NarrativePrompt<'a> {
    brand: &'a str,
    window_days: u32,
    no_sales_sentinel: String,
    lines: Vec<String>,
}

/// [`Narrator`] backed by Claude.
#[derive(Debug, Clone)]
pub struct NarrativeService {
    client: Option<ClaudeClient>,
    window: SalesWindow,
}

impl NarrativeService {
    /// Create a narrative service. Without a client every request fails
    /// with [`NarrativeError::MissingCredential`].
    #[must_use]
    pub const fn new(client: Option<ClaudeClient>, window: SalesWindow) -> Self {
        Self { client, window }
    }

    /// Render the prompt sent for `rows`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn prompt(&self, brand: &str, rows: &[CoverageRow]) -> Result<String, NarrativeError> {
        Ok(NarrativePrompt {
            brand,
            window_days: self.window.days(),
            no_sales_sentinel: format!("{:.0}", Coverage::NO_SALES_SENTINEL),
            lines: rows.iter().map(summary_line).collect(),
        }
        .render()?)
    }
}

impl Narrator for NarrativeService {
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn summarize(&self, brand: &str, rows: &[CoverageRow]) -> Result<String, NarrativeError> {
        let client = self
            .client
            .as_ref()
            .ok_or(NarrativeError::MissingCredential)?;
        let prompt = self.prompt(brand, rows)?;
        let text = client.complete(&prompt).await?;
        info!(chars = text.len(), "Narrative generated");
        Ok(text)
    }
}

/// Ask `narrator` for a summary, degrading to [`NARRATIVE_PLACEHOLDER`].
pub async fn summarize_or_placeholder<N: Narrator>(
    narrator: &N,
    brand: &str,
    rows: &[CoverageRow],
) -> String {
    match narrator.summarize(brand, rows).await {
        Ok(text) => text,
        Err(e) => {
            warn!(brand = %brand, error = %e, "Narrative unavailable, using placeholder");
            NARRATIVE_PLACEHOLDER.to_string()
        }
    }
}

/// One condensed prompt line, every figure rounded to an integer.
fn summary_line(row: &CoverageRow) -> String {
    format!(
        "{}: stock {:.0}, sold {:.0}, coverage {:.0} days, pending {:.0}",
        row.name,
        row.stock,
        row.window_sales,
        row.coverage.as_number(),
        row.pending
    )
}
