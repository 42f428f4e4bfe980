//! Integration tests for the stock coverage report.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stock-coverage-integration-tests
//! ```
//!
//! The tests drive complete report runs against the in-memory fakes below,
//! so no Odoo instance, Claude key or SMTP server is needed.

use std::cell::RefCell;

use chrono::{NaiveDate, NaiveDateTime};

use stock_coverage_core::{
    BillOfMaterials, BomId, BomLine, BomLineId, CoverageRow, Product, ProductId, SalesLine,
    TemplateId,
};
use stock_coverage_report::RenderedReport;
use stock_coverage_report::odoo::OdooError;
use stock_coverage_report::pipeline::{ErpSource, ProductQuery};
use stock_coverage_report::services::{EmailError, Mailer, NarrativeError, Narrator};

/// Build a product snapshot.
#[must_use]
pub fn product(id: i64, sku: &str, name: &str, stock: f64, pending: f64) -> Product {
    Product {
        id: ProductId::new(id),
        template_id: Some(TemplateId::new(id * 10)),
        sku: (!sku.is_empty()).then(|| sku.to_string()),
        barcode: None,
        name: name.to_string(),
        stock,
        pending,
    }
}

/// Midday on `date`.
#[must_use]
pub fn at_noon(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(12, 0, 0).unwrap_or_default()
}

/// ERP calls a [`FakeErp`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErpCall {
    /// Bill-of-materials lookup for a product.
    FindBillOfMaterials,
    /// Reading the lines of a pack's bill-of-materials.
    ReadBomLines,
    /// Reading products by ID.
    ReadProducts,
    /// Searching sales lines.
    SearchSalesLines,
}

/// In-memory ERP.
///
/// Products are searched by case-insensitive substring on name (and SKU when
/// asked). Components only reachable through a bill-of-materials should be
/// added with [`FakeErp::with_component`] so that brand searches do not
/// find them.
#[derive(Debug, Default)]
pub struct FakeErp {
    searchable: Vec<Product>,
    catalog: Vec<Product>,
    boms: Vec<(ProductId, BillOfMaterials)>,
    bom_lines: Vec<BomLine>,
    sales: Vec<SalesLine>,
    failing_terms: Vec<String>,
    failing_calls: Vec<(ErpCall, ProductId)>,
}

impl FakeErp {
    /// An empty ERP.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product that brand searches can find.
    #[must_use]
    pub fn with_product(mut self, product: Product) -> Self {
        self.catalog.push(product.clone());
        self.searchable.push(product);
        self
    }

    /// Add a product only readable by ID.
    #[must_use]
    pub fn with_component(mut self, product: Product) -> Self {
        self.catalog.push(product);
        self
    }

    /// Give `pack` a bill-of-materials of `(component, quantity)` lines.
    #[must_use]
    pub fn with_bom(mut self, pack: i64, components: &[(i64, f64)]) -> Self {
        let bom_id = i64::try_from(self.boms.len()).unwrap_or_default() + 1;
        let mut line_ids = Vec::with_capacity(components.len());
        for (component, quantity) in components {
            let line_id = BomLineId::new(
                i64::try_from(self.bom_lines.len()).unwrap_or_default() + 1,
            );
            line_ids.push(line_id);
            self.bom_lines.push(BomLine {
                id: line_id,
                component: ProductId::new(*component),
                quantity: *quantity,
            });
        }
        self.boms.push((
            ProductId::new(pack),
            BillOfMaterials {
                id: BomId::new(bom_id),
                line_ids,
            },
        ));
        self
    }

    /// Record a confirmed sale.
    #[must_use]
    pub fn with_sale(mut self, product: i64, quantity: f64, date: NaiveDate) -> Self {
        self.sales.push(SalesLine {
            product_id: ProductId::new(product),
            quantity,
            created_at: at_noon(date),
        });
        self
    }

    /// Make every product search for `term` fail.
    #[must_use]
    pub fn failing_on(mut self, term: &str) -> Self {
        self.failing_terms.push(term.to_lowercase());
        self
    }

    /// Make `call` fail whenever it involves `product`.
    ///
    /// For [`ErpCall::ReadBomLines`], `product` is the pack whose lines are
    /// read.
    #[must_use]
    pub fn failing_call(mut self, call: ErpCall, product: i64) -> Self {
        self.failing_calls.push((call, ProductId::new(product)));
        self
    }

    fn fails(&self, call: ErpCall, products: &[ProductId]) -> Result<(), OdooError> {
        let failing = self
            .failing_calls
            .iter()
            .any(|(c, product)| *c == call && products.contains(product));
        if failing {
            Err(OdooError::Status(502))
        } else {
            Ok(())
        }
    }
}

impl ErpSource for FakeErp {
    async fn search_products(&self, query: &ProductQuery) -> Result<Vec<Product>, OdooError> {
        let term = query.term.to_lowercase();
        if self.failing_terms.contains(&term) {
            return Err(OdooError::Status(502));
        }
        Ok(self
            .searchable
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&term)
                    || (query.match_sku
                        && p.sku
                            .as_deref()
                            .is_some_and(|sku| sku.to_lowercase().contains(&term)))
            })
            .cloned()
            .collect())
    }

    async fn find_bill_of_materials(
        &self,
        product: &Product,
    ) -> Result<Option<BillOfMaterials>, OdooError> {
        self.fails(ErpCall::FindBillOfMaterials, &[product.id])?;
        Ok(self
            .boms
            .iter()
            .find(|(owner, _)| *owner == product.id)
            .map(|(_, bom)| bom.clone()))
    }

    async fn read_bom_lines(&self, ids: &[BomLineId]) -> Result<Vec<BomLine>, OdooError> {
        let packs: Vec<ProductId> = self
            .boms
            .iter()
            .filter(|(_, bom)| bom.line_ids.iter().any(|id| ids.contains(id)))
            .map(|(pack, _)| *pack)
            .collect();
        self.fails(ErpCall::ReadBomLines, &packs)?;
        Ok(self
            .bom_lines
            .iter()
            .filter(|line| ids.contains(&line.id))
            .cloned()
            .collect())
    }

    async fn read_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, OdooError> {
        self.fails(ErpCall::ReadProducts, ids)?;
        Ok(self
            .catalog
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn search_sales_lines(
        &self,
        products: &[ProductId],
        since: NaiveDate,
    ) -> Result<Vec<SalesLine>, OdooError> {
        self.fails(ErpCall::SearchSalesLines, products)?;
        Ok(self
            .sales
            .iter()
            .filter(|line| products.contains(&line.product_id) && line.created_at.date() >= since)
            .cloned()
            .collect())
    }
}

/// Narrator returning fixed text, or failing like a missing credential.
#[derive(Debug, Clone)]
pub struct StaticNarrator(pub Option<String>);

impl Narrator for StaticNarrator {
    async fn summarize(&self, _brand: &str, _rows: &[CoverageRow]) -> Result<String, NarrativeError> {
        self.0.clone().ok_or(NarrativeError::MissingCredential)
    }
}

/// Mailer that keeps every report it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: RefCell<Vec<RenderedReport>>,
    reject: bool,
}

impl RecordingMailer {
    /// A mailer that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose deliveries always fail.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            sent: RefCell::default(),
            reject: true,
        }
    }

    /// Reports delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<RenderedReport> {
        self.sent.borrow().clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send_report(&self, report: &RenderedReport) -> Result<(), EmailError> {
        if self.reject {
            return Err(EmailError::InvalidAddress("relay rejected recipient".to_string()));
        }
        self.sent.borrow_mut().push(report.clone());
        Ok(())
    }
}
