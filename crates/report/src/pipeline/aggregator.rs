//! Sales lines to per-product totals.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use tracing::{debug, instrument};

use stock_coverage_core::{Product, ProductId, SalesLine, SalesTotals, SalesWindow};

use crate::odoo::OdooError;

use super::ErpSource;

/// Date bounds of one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesPeriod {
    /// First day of the lookback window (inclusive).
    pub since: NaiveDate,
    /// First day of the current month, when month-to-date totals are
    /// tracked.
    pub month_start: Option<NaiveDate>,
}

impl SalesPeriod {
    /// The `window` days before `today`, plus the month `today` is in.
    #[must_use]
    pub fn ending(today: NaiveDate, window: SalesWindow, month_to_date: bool) -> Self {
        let since = today
            .checked_sub_days(Days::new(u64::from(window.days())))
            .unwrap_or(NaiveDate::MIN);
        Self {
            since,
            month_start: month_to_date.then(|| today.with_day(1).unwrap_or(today)),
        }
    }

    /// Earliest date any total needs; the month can start before the
    /// window does.
    #[must_use]
    pub fn fetch_from(&self) -> NaiveDate {
        self.month_start
            .map_or(self.since, |month_start| month_start.min(self.since))
    }
}

/// Fetches sales lines and sums them per product.
#[derive(Debug)]
pub struct SalesAggregator<'a, E> {
    source: &'a E,
}

impl<'a, E: ErpSource> SalesAggregator<'a, E> {
    /// Create an aggregator over `source`.
    #[must_use]
    pub const fn new(source: &'a E) -> Self {
        Self { source }
    }

    /// Totals for every product in `products`.
    ///
    /// # Errors
    ///
    /// Returns the `OdooError` raised by the source.
    #[instrument(skip(self, products), fields(products = products.len()))]
    pub async fn aggregate(
        &self,
        products: &[Product],
        period: SalesPeriod,
    ) -> Result<HashMap<ProductId, SalesTotals>, OdooError> {
        let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let lines = self
            .source
            .search_sales_lines(&ids, period.fetch_from())
            .await?;
        debug!(lines = lines.len(), "Fetched sales lines");
        Ok(aggregate_sales(&ids, &lines, period))
    }
}

/// Sum `lines` per product.
///
/// Every ID in `products` gets an entry, zero when nothing sold. Lines for
/// other products are ignored.
#[must_use]
pub fn aggregate_sales(
    products: &[ProductId],
    lines: &[SalesLine],
    period: SalesPeriod,
) -> HashMap<ProductId, SalesTotals> {
    let empty = SalesTotals {
        window: 0.0,
        month_to_date: period.month_start.map(|_| 0.0),
    };
    let mut totals: HashMap<ProductId, SalesTotals> =
        products.iter().map(|id| (*id, empty)).collect();

    for line in lines {
        let Some(entry) = totals.get_mut(&line.product_id) else {
            continue;
        };
        let day = line.created_at.date();
        if day >= period.since {
            entry.window += line.quantity;
        }
        if let (Some(month_start), Some(month)) = (period.month_start, entry.month_to_date.as_mut())
            && day >= month_start
        {
            *month += line.quantity;
        }
    }

    totals
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(product: i64, quantity: f64, day: NaiveDate) -> SalesLine {
        SalesLine {
            product_id: ProductId::new(product),
            quantity,
            created_at: day.and_hms_opt(10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_period_ending() {
        let period = SalesPeriod::ending(date(2026, 10, 15), SalesWindow::THIRTY_DAYS, true);
        assert_eq!(period.since, date(2026, 9, 15));
        assert_eq!(period.month_start, Some(date(2026, 10, 1)));
        assert_eq!(period.fetch_from(), date(2026, 9, 15));

        let period = SalesPeriod::ending(date(2026, 10, 28), SalesWindow::FIFTEEN_DAYS, true);
        assert_eq!(period.since, date(2026, 10, 13));
        assert_eq!(period.fetch_from(), date(2026, 10, 1));

        let period = SalesPeriod::ending(date(2026, 10, 28), SalesWindow::FIFTEEN_DAYS, false);
        assert_eq!(period.month_start, None);
        assert_eq!(period.fetch_from(), date(2026, 10, 13));
    }

    #[test]
    fn test_sums_window_and_month() {
        let period = SalesPeriod::ending(date(2026, 10, 15), SalesWindow::THIRTY_DAYS, true);
        let lines = vec![
            line(1, 4.0, date(2026, 9, 20)),
            line(1, 2.0, date(2026, 10, 1)),
            line(1, 1.5, date(2026, 10, 14)),
            line(2, 3.0, date(2026, 9, 15)),
        ];

        let totals = aggregate_sales(&[ProductId::new(1), ProductId::new(2)], &lines, period);

        let first = totals[&ProductId::new(1)];
        assert!((first.window - 7.5).abs() < f64::EPSILON);
        assert_eq!(first.month_to_date, Some(3.5));

        let second = totals[&ProductId::new(2)];
        assert!((second.window - 3.0).abs() < f64::EPSILON);
        assert_eq!(second.month_to_date, Some(0.0));
    }

    #[test]
    fn test_products_without_sales_get_zero() {
        let period = SalesPeriod::ending(date(2026, 10, 15), SalesWindow::THIRTY_DAYS, false);
        let totals = aggregate_sales(&[ProductId::new(9)], &[], period);
        assert_eq!(
            totals[&ProductId::new(9)],
            SalesTotals {
                window: 0.0,
                month_to_date: None
            }
        );
    }

    #[test]
    fn test_month_lines_before_window_count_only_for_month() {
        let period = SalesPeriod::ending(date(2026, 10, 28), SalesWindow::FIFTEEN_DAYS, true);
        let lines = vec![
            line(1, 5.0, date(2026, 10, 2)),
            line(1, 1.0, date(2026, 10, 20)),
        ];

        let totals = aggregate_sales(&[ProductId::new(1)], &lines, period);

        let totals = totals[&ProductId::new(1)];
        assert!((totals.window - 1.0).abs() < f64::EPSILON);
        assert_eq!(totals.month_to_date, Some(6.0));
    }

    #[test]
    fn test_unrequested_products_are_ignored() {
        let period = SalesPeriod::ending(date(2026, 10, 15), SalesWindow::THIRTY_DAYS, true);
        let totals = aggregate_sales(
            &[ProductId::new(1)],
            &[line(2, 10.0, date(2026, 10, 10))],
            period,
        );
        assert_eq!(totals.len(), 1);
    }
}
