//! Coverage rows and their ranking.

use std::collections::HashMap;

use stock_coverage_core::{CoverageRow, Product, ProductId, SalesTotals, SalesWindow};

/// One row per product, in product order.
///
/// Products missing from `totals` are treated as having sold nothing.
#[must_use]
pub fn calculate_rows(
    products: Vec<Product>,
    totals: &HashMap<ProductId, SalesTotals>,
    window: SalesWindow,
) -> Vec<CoverageRow> {
    products
        .into_iter()
        .map(|product| {
            let sold = totals.get(&product.id).copied().unwrap_or_default();
            CoverageRow::new(product, sold, window)
        })
        .collect()
}

/// Sort by window sales, best sellers first, and keep the first `top_n`.
///
/// The sort is stable: rows with equal sales keep their input order.
#[must_use]
pub fn rank_rows(mut rows: Vec<CoverageRow>, top_n: Option<usize>) -> Vec<CoverageRow> {
    rows.sort_by(|a, b| b.window_sales.total_cmp(&a.window_sales));
    if let Some(limit) = top_n {
        rows.truncate(limit);
    }
    rows
}
