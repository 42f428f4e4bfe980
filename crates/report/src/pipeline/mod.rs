//! The per-brand coverage pipeline.
//!
//! Resolver → Aggregator → Calculator, strictly forward, with no state kept
//! between brands or runs:
//!
//! - [`resolver`] - brand filter to a deduplicated product list, exploding
//!   packs into components for composite brands
//! - [`aggregator`] - sales lines to per-product window and month totals
//! - [`calculator`] - products plus totals to [`CoverageRow`]s
//!
//! The ERP is reached only through [`ErpSource`], so the whole pipeline runs
//! against in-memory fakes in tests.
//!
//! [`CoverageRow`]: stock_coverage_core::CoverageRow

pub mod aggregator;
pub mod calculator;
pub mod resolver;

use std::future::Future;

use chrono::NaiveDate;

use stock_coverage_core::{BillOfMaterials, BomLine, BomLineId, Product, ProductId, SalesLine};

use crate::odoo::OdooError;

pub use aggregator::{SalesAggregator, SalesPeriod, aggregate_sales};
pub use calculator::{calculate_rows, rank_rows};
pub use resolver::ProductResolver;

/// Product search criteria for one brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Case-insensitive substring.
    pub term: String,
    /// Match the term against SKUs as well as names.
    pub match_sku: bool,
}

/// Read access to the ERP data the report needs.
pub trait ErpSource {
    /// Products whose name (or SKU) contains the query term.
    fn search_products(
        &self,
        query: &ProductQuery,
    ) -> impl Future<Output = Result<Vec<Product>, OdooError>>;

    /// The bill-of-materials of `product`, if it has one.
    fn find_bill_of_materials(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<Option<BillOfMaterials>, OdooError>>;

    /// Read bill-of-materials lines by ID.
    fn read_bom_lines(
        &self,
        ids: &[BomLineId],
    ) -> impl Future<Output = Result<Vec<BomLine>, OdooError>>;

    /// Read products by ID. Unknown IDs are omitted from the result.
    fn read_products(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<Product>, OdooError>>;

    /// Confirmed or done sales lines for `products` created on or after
    /// `since`.
    fn search_sales_lines(
        &self,
        products: &[ProductId],
        since: NaiveDate,
    ) -> impl Future<Output = Result<Vec<SalesLine>, OdooError>>;
}
