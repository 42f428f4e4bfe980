//! Days-of-coverage estimate and its severity buckets.
//!
//! Coverage answers "how many days will current stock last at the recent
//! average daily sell-through". It is a point estimate: constant run-rate,
//! no seasonality, no incoming stock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when building a [`SalesWindow`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// The window must cover at least one day.
    #[error("sales window must be at least 1 day")]
    Empty,
    /// The window is longer than a year.
    #[error("sales window must be at most {max} days (got {got})")]
    TooLong {
        /// Maximum allowed length.
        max: u32,
        /// Requested length.
        got: u32,
    },
}

/// Trailing period sales are aggregated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SalesWindow(u32);

impl SalesWindow {
    /// Longest supported window.
    pub const MAX_DAYS: u32 = 365;

    /// Two-week window used by the short-horizon reports.
    pub const FIFTEEN_DAYS: Self = Self(15);

    /// Default window.
    pub const THIRTY_DAYS: Self = Self(30);

    /// Create a window of `days` days.
    ///
    /// # Errors
    ///
    /// Returns an error if `days` is zero or longer than [`Self::MAX_DAYS`].
    pub const fn new(days: u32) -> Result<Self, WindowError> {
        if days == 0 {
            return Err(WindowError::Empty);
        }
        if days > Self::MAX_DAYS {
            return Err(WindowError::TooLong {
                max: Self::MAX_DAYS,
                got: days,
            });
        }
        Ok(Self(days))
    }

    /// Window length in days.
    #[must_use]
    pub const fn days(self) -> u32 {
        self.0
    }

    /// Average units sold per day over the window.
    #[must_use]
    pub fn daily_rate(self, sold: f64) -> f64 {
        sold / f64::from(self.0)
    }
}

impl TryFrom<u32> for SalesWindow {
    type Error = WindowError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<SalesWindow> for u32 {
    fn from(window: SalesWindow) -> Self {
        window.0
    }
}

/// Estimated stock coverage for one product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum Coverage {
    /// Days of stock left at the current run-rate. Zero when there is
    /// neither stock nor sales.
    Days(f64),
    /// Stock on hand but nothing sold in the window; no estimate possible.
    NoRecentSales,
}

impl Coverage {
    /// Numeric stand-in for [`Coverage::NoRecentSales`] in plain-number
    /// contexts such as the narrative prompt.
    pub const NO_SALES_SENTINEL: f64 = 999.0;

    /// Estimate coverage from on-hand stock and sales over `window`.
    #[must_use]
    pub fn estimate(stock: f64, window_sales: f64, window: SalesWindow) -> Self {
        let daily = window.daily_rate(window_sales);
        if daily > 0.0 {
            Self::Days(stock / daily)
        } else if stock > 0.0 {
            Self::NoRecentSales
        } else {
            Self::Days(0.0)
        }
    }

    /// Days of coverage, if an estimate exists.
    #[must_use]
    pub const fn days(self) -> Option<f64> {
        match self {
            Self::Days(days) => Some(days),
            Self::NoRecentSales => None,
        }
    }

    /// Coverage as a single number, using [`Self::NO_SALES_SENTINEL`] when
    /// there is no estimate.
    #[must_use]
    pub const fn as_number(self) -> f64 {
        match self {
            Self::Days(days) => days,
            Self::NoRecentSales => Self::NO_SALES_SENTINEL,
        }
    }

    /// Severity bucket, or `None` when there were no recent sales.
    #[must_use]
    pub fn severity(self, thresholds: &CoverageThresholds) -> Option<Severity> {
        self.days().map(|days| thresholds.classify(days))
    }
}

/// Severity bucket used to color coverage in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Stock runs out within the critical threshold.
    Critical,
    /// Stock runs out within the low threshold.
    Low,
    /// Enough stock.
    Ok,
}

impl Severity {
    /// CSS class used by the report template.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Low => "low",
            Self::Ok => "ok",
        }
    }
}

/// Day thresholds separating severity buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageThresholds {
    /// Below this many days coverage is critical.
    pub critical_days: f64,
    /// Below this many days coverage is low.
    pub low_days: f64,
}

impl Default for CoverageThresholds {
    fn default() -> Self {
        Self {
            critical_days: 7.0,
            low_days: 15.0,
        }
    }
}

impl CoverageThresholds {
    /// Bucket a number of days.
    #[must_use]
    pub fn classify(&self, days: f64) -> Severity {
        if days < self.critical_days {
            Severity::Critical
        } else if days < self.low_days {
            Severity::Low
        } else {
            Severity::Ok
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn window(days: u32) -> SalesWindow {
        SalesWindow::new(days).unwrap()
    }

    #[test]
    fn test_window_bounds() {
        assert_eq!(SalesWindow::new(0), Err(WindowError::Empty));
        assert!(matches!(
            SalesWindow::new(400),
            Err(WindowError::TooLong { got: 400, .. })
        ));
        assert_eq!(window(30).days(), 30);
    }

    #[test]
    fn test_window_deserializes_with_validation() {
        let ok: SalesWindow = serde_json::from_str("15").unwrap();
        assert_eq!(ok.days(), 15);
        assert!(serde_json::from_str::<SalesWindow>("0").is_err());
    }

    #[test]
    fn test_estimate_with_sales() {
        // 30 sold over 15 days = 2/day, 20 in stock = 10 days
        let coverage = Coverage::estimate(20.0, 30.0, window(15));
        assert_eq!(coverage, Coverage::Days(10.0));
        assert_eq!(
            coverage.severity(&CoverageThresholds::default()),
            Some(Severity::Low)
        );
    }

    #[test]
    fn test_estimate_thirty_day_window() {
        let coverage = Coverage::estimate(90.0, 60.0, window(30));
        assert_eq!(coverage, Coverage::Days(45.0));
    }

    #[test]
    fn test_stock_without_sales_has_no_estimate() {
        for stock in [0.5, 1.0, 250.0] {
            let coverage = Coverage::estimate(stock, 0.0, window(30));
            assert_eq!(coverage, Coverage::NoRecentSales);
            assert_eq!(coverage.days(), None);
            assert_eq!(coverage.severity(&CoverageThresholds::default()), None);
        }
    }

    #[test]
    fn test_no_stock_no_sales_is_zero_days() {
        let coverage = Coverage::estimate(0.0, 0.0, window(30));
        assert_eq!(coverage, Coverage::Days(0.0));
        assert_eq!(
            coverage.severity(&CoverageThresholds::default()),
            Some(Severity::Critical)
        );
    }

    #[test]
    fn test_negative_stock_without_sales_is_zero_days() {
        assert_eq!(
            Coverage::estimate(-3.0, 0.0, window(15)),
            Coverage::Days(0.0)
        );
    }

    #[test]
    fn test_no_stock_with_sales_is_zero_days() {
        assert_eq!(
            Coverage::estimate(0.0, 12.0, window(30)),
            Coverage::Days(0.0)
        );
    }

    #[test]
    fn test_sentinel_only_in_number_form() {
        assert!((Coverage::NoRecentSales.as_number() - 999.0).abs() < f64::EPSILON);
        assert!((Coverage::Days(4.5).as_number() - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold_edges() {
        let thresholds = CoverageThresholds::default();
        assert_eq!(thresholds.classify(6.99), Severity::Critical);
        assert_eq!(thresholds.classify(7.0), Severity::Low);
        assert_eq!(thresholds.classify(14.99), Severity::Low);
        assert_eq!(thresholds.classify(15.0), Severity::Ok);
        assert_eq!(thresholds.classify(5000.0), Severity::Ok);
    }

    #[test]
    fn test_coverage_serialization() {
        let json = serde_json::to_value(Coverage::Days(3.0)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "days", "days": 3.0}));
        let json = serde_json::to_value(Coverage::NoRecentSales).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "no_recent_sales"}));
    }

    #[test]
    fn test_css_classes() {
        assert_eq!(Severity::Critical.css_class(), "critical");
        assert_eq!(Severity::Low.css_class(), "low");
        assert_eq!(Severity::Ok.css_class(), "ok");
    }
}
