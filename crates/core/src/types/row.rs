//! Computed report row.

use serde::{Deserialize, Serialize};

use super::coverage::{Coverage, SalesWindow};
use super::id::ProductId;
use super::product::Product;
use super::sales::SalesTotals;

/// One product line of a coverage report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRow {
    /// Product the row describes.
    pub product_id: ProductId,
    /// Internal reference, `None` when the ERP has none.
    pub sku: Option<String>,
    /// EAN/UPC barcode.
    pub barcode: Option<String>,
    /// Display name.
    pub name: String,
    /// Quantity on hand.
    pub stock: f64,
    /// Quantity expected from incoming receipts.
    pub pending: f64,
    /// Units sold over the window.
    pub window_sales: f64,
    /// Units sold since the first of the month, when tracked.
    pub month_sales: Option<f64>,
    /// Estimated days of stock left.
    pub coverage: Coverage,
}

impl CoverageRow {
    /// Rendered in place of a missing SKU.
    pub const MISSING_SKU: &'static str = "N/A";

    /// Combine a product snapshot with its sales totals.
    #[must_use]
    pub fn new(product: Product, totals: SalesTotals, window: SalesWindow) -> Self {
        let coverage = Coverage::estimate(product.stock, totals.window, window);
        Self {
            product_id: product.id,
            sku: product.sku,
            barcode: product.barcode,
            name: product.name,
            stock: product.stock,
            pending: product.pending,
            window_sales: totals.window,
            month_sales: totals.month_to_date,
            coverage,
        }
    }

    /// SKU for display, falling back to [`Self::MISSING_SKU`] when absent
    /// or blank.
    #[must_use]
    pub fn sku_or_placeholder(&self) -> &str {
        self.sku
            .as_deref()
            .filter(|sku| !sku.trim().is_empty())
            .unwrap_or(Self::MISSING_SKU)
    }
}
