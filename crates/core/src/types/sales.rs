//! Sales order lines and their per-product totals.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// One confirmed sales order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesLine {
    /// Product sold.
    pub product_id: ProductId,
    /// Ordered quantity.
    pub quantity: f64,
    /// Creation timestamp of the line (ERP server time).
    pub created_at: NaiveDateTime,
}

/// Quantities sold for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesTotals {
    /// Total over the whole lookback window.
    pub window: f64,
    /// Total since the first day of the current month, when tracked.
    pub month_to_date: Option<f64>,
}
