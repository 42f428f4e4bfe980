//! HTML and plain-text rendering of a report.
//!
//! Rows are turned into display strings here so the templates stay free of
//! logic: figures rounded to integers, coverage labelled and classed, and
//! missing SKU or barcode replaced by their placeholders.

use askama::Template;
use chrono::NaiveDate;
use thiserror::Error;

use stock_coverage_core::{Coverage, CoverageRow};

use crate::config::ReportOptions;

/// Shown in the EAN column when a product has no barcode.
const MISSING_BARCODE: &str = "-";

/// CSS class for coverage without recent sales.
const NO_SALES_CLASS: &str = "no-sales";

const FOOTER: &str = "Generated automatically from Odoo.";

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// One brand's ranked rows, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandReport {
    /// Brand filter the rows were resolved from.
    pub brand: String,
    /// Ranked and capped rows.
    pub rows: Vec<CoverageRow>,
    /// Narrative summary, when enabled.
    pub narrative: Option<String>,
}

/// A report ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// Email subject.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Plain-text alternative body.
    pub text: String,
}

#[derive(Template)]
#[template(path = "report/coverage.html")]
struct CoverageHtml<'a> {
    title: &'a str,
    window_label: &'a str,
    footer: &'a str,
    sections: &'a [SectionView],
}

#[derive(Template)]
#[template(path = "report/coverage.txt")]
struct CoverageText<'a> {
    window_label: &'a str,
    footer: &'a str,
    sections: &'a [SectionView],
}

struct SectionView {
    heading: String,
    caption: String,
    narrative: Vec<String>,
    show_month: bool,
    rows: Vec<RowView>,
}

struct RowView {
    sku: String,
    ean: String,
    name: String,
    stock: String,
    pending: String,
    month_sales: String,
    window_sales: String,
    coverage_label: String,
    coverage_class: &'static str,
}

/// Renders brand sections into one document.
#[derive(Debug, Clone, Copy)]
pub struct ReportRenderer<'a> {
    options: &'a ReportOptions,
}

impl<'a> ReportRenderer<'a> {
    /// Create a renderer for `options`.
    #[must_use]
    pub const fn new(options: &'a ReportOptions) -> Self {
        Self { options }
    }

    /// Render `sections`, in order, into one report dated `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to render.
    pub fn render(
        &self,
        sections: &[BrandReport],
        date: NaiveDate,
    ) -> Result<RenderedReport, RenderError> {
        let subject = subject(sections, date);
        let window_label = format!("Sales {}d", self.options.window_days.days());
        let views: Vec<SectionView> = sections.iter().map(|s| self.section_view(s)).collect();

        let html = CoverageHtml {
            title: &subject,
            window_label: &window_label,
            footer: FOOTER,
            sections: &views,
        }
        .render()?;
        let text = CoverageText {
            window_label: &window_label,
            footer: FOOTER,
            sections: &views,
        }
        .render()?;

        Ok(RenderedReport {
            subject,
            html,
            text,
        })
    }

    /// "Top N best sellers" or "All products" caption for the configured cap.
    #[must_use]
    pub fn caption(&self) -> String {
        let days = self.options.window_days.days();
        match self.options.top_n {
            Some(n) => format!("Top {n} best sellers over the last {days} days"),
            None => format!("All products ranked by sales over the last {days} days"),
        }
    }

    /// Display label and CSS class of a coverage value.
    #[must_use]
    pub fn coverage_label(&self, coverage: Coverage) -> (String, &'static str) {
        match coverage {
            Coverage::NoRecentSales => ("No sales".to_string(), NO_SALES_CLASS),
            Coverage::Days(days) => {
                let class = self.options.thresholds.classify(days).css_class();
                let label = match self.options.display_cap_days {
                    Some(cap) if days > cap => format!("+{cap:.0} days"),
                    _ => format!("{days:.0} days"),
                };
                (label, class)
            }
        }
    }

    fn section_view(&self, section: &BrandReport) -> SectionView {
        SectionView {
            heading: format!("Stock & coverage report: {}", section.brand),
            caption: self.caption(),
            narrative: section
                .narrative
                .as_deref()
                .map(|text| text.lines().map(str::to_string).collect())
                .unwrap_or_default(),
            show_month: self.options.month_to_date,
            rows: section.rows.iter().map(|row| self.row_view(row)).collect(),
        }
    }

    fn row_view(&self, row: &CoverageRow) -> RowView {
        let (coverage_label, coverage_class) = self.coverage_label(row.coverage);
        RowView {
            sku: row.sku_or_placeholder().to_string(),
            ean: row
                .barcode
                .clone()
                .unwrap_or_else(|| MISSING_BARCODE.to_string()),
            name: row.name.clone(),
            stock: whole(row.stock),
            pending: whole(row.pending),
            month_sales: whole(row.month_sales.unwrap_or_default()),
            window_sales: whole(row.window_sales),
            coverage_label,
            coverage_class,
        }
    }
}

/// `Stock & coverage: <brands> - dd/mm/YYYY`.
fn subject(sections: &[BrandReport], date: NaiveDate) -> String {
    let brands: Vec<&str> = sections.iter().map(|s| s.brand.as_str()).collect();
    format!(
        "Stock & coverage: {} - {}",
        brands.join(", "),
        date.format("%d/%m/%Y")
    )
}

/// A quantity rounded to an integer for display.
fn whole(value: f64) -> String {
    format!("{value:.0}")
}
