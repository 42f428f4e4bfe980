//! One report run: every configured brand through the pipeline, then render
//! and send.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info, instrument};

use stock_coverage_core::Product;

use crate::config::{BrandConfig, PackExplosionConfig, ReportOptions};
use crate::odoo::OdooError;
use crate::pipeline::{
    ErpSource, ProductResolver, SalesAggregator, SalesPeriod, calculate_rows, rank_rows,
};
use crate::render::{BrandReport, RenderError, RenderedReport, ReportRenderer};
use crate::services::{EmailError, Mailer, Narrator, summarize_or_placeholder};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The report could not be rendered.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The report was sent.
    Sent {
        /// Number of brand sections in the report.
        sections: usize,
    },
    /// No brand produced any rows; nothing was sent.
    NothingToSend,
    /// The report was rendered but delivery failed.
    SendFailed(EmailError),
}

impl RunOutcome {
    /// Whether the run should be reported as successful.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::SendFailed(_))
    }
}

/// A configured report run over an ERP source and a narrator.
#[derive(Debug)]
pub struct ReportJob<'a, E, N> {
    source: &'a E,
    narrator: &'a N,
    brands: &'a [BrandConfig],
    options: &'a ReportOptions,
    pack: &'a PackExplosionConfig,
}

impl<'a, E: ErpSource, N: Narrator> ReportJob<'a, E, N> {
    /// Create a job for `brands`, in configuration order.
    #[must_use]
    pub const fn new(
        source: &'a E,
        narrator: &'a N,
        brands: &'a [BrandConfig],
        options: &'a ReportOptions,
        pack: &'a PackExplosionConfig,
    ) -> Self {
        Self {
            source,
            narrator,
            brands,
            options,
            pack,
        }
    }

    /// Build one section per brand that produced rows.
    ///
    /// Brands run one after another. A brand whose ERP calls fail is logged
    /// and left out; the others are unaffected.
    pub async fn build_sections(&self, today: NaiveDate) -> Vec<BrandReport> {
        let period = SalesPeriod::ending(today, self.options.window_days, self.options.month_to_date);
        let mut sections = Vec::with_capacity(self.brands.len());

        for brand in self.brands {
            match self.brand_section(brand, period).await {
                Ok(Some(section)) => sections.push(section),
                Ok(None) => info!(brand = %brand.name, "No products matched, skipping brand"),
                Err(e) => error!(brand = %brand.name, error = %e, "ERP request failed, skipping brand"),
            }
        }

        sections
    }

    /// Build and render the report without sending it.
    ///
    /// Returns `None` when no brand produced rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the report fails to render.
    pub async fn prepare(&self, today: NaiveDate) -> Result<Option<RenderedReport>, RunError> {
        Ok(self.render_sections(today).await?.map(|(report, _)| report))
    }

    /// Build, render and send the report.
    ///
    /// A delivery failure is logged and reported as
    /// [`RunOutcome::SendFailed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the report fails to render.
    #[instrument(skip(self, mailer), fields(brands = self.brands.len()))]
    pub async fn run<M: Mailer>(&self, mailer: &M, today: NaiveDate) -> Result<RunOutcome, RunError> {
        let Some((report, sections)) = self.render_sections(today).await? else {
            return Ok(RunOutcome::NothingToSend);
        };

        match mailer.send_report(&report).await {
            Ok(()) => Ok(RunOutcome::Sent { sections }),
            Err(e) => {
                error!(error = %e, subject = %report.subject, "Failed to send report");
                Ok(RunOutcome::SendFailed(e))
            }
        }
    }

    async fn render_sections(
        &self,
        today: NaiveDate,
    ) -> Result<Option<(RenderedReport, usize)>, RunError> {
        let sections = self.build_sections(today).await;
        if sections.is_empty() {
            info!("No brand produced rows, nothing to send");
            return Ok(None);
        }
        let report = ReportRenderer::new(self.options).render(&sections, today)?;
        Ok(Some((report, sections.len())))
    }

    #[instrument(skip(self, brand, period), fields(brand = %brand.name))]
    async fn brand_section(
        &self,
        brand: &BrandConfig,
        period: SalesPeriod,
    ) -> Result<Option<BrandReport>, OdooError> {
        let products: Vec<Product> = ProductResolver::new(self.source, self.pack)
            .resolve(brand)
            .await?;
        if products.is_empty() {
            return Ok(None);
        }

        let totals = SalesAggregator::new(self.source)
            .aggregate(&products, period)
            .await?;
        let resolved = products.len();
        let rows = rank_rows(
            calculate_rows(products, &totals, self.options.window_days),
            self.options.top_n,
        );
        info!(resolved, rows = rows.len(), "Brand section ready");

        let narrative = if self.options.narrative {
            Some(summarize_or_placeholder(self.narrator, &brand.name, &rows).await)
        } else {
            None
        };

        Ok(Some(BrandReport {
            brand: brand.name.clone(),
            rows,
            narrative,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        assert!(RunOutcome::Sent { sections: 2 }.is_success());
        assert!(RunOutcome::NothingToSend.is_success());
        assert!(
            !RunOutcome::SendFailed(EmailError::InvalidAddress("nobody".to_string()))
                .is_success()
        );
    }
}
