//! [`ErpSource`] implementation backed by the Odoo models.

use chrono::NaiveDate;
use serde_json::{Value, json};
use tracing::instrument;

use stock_coverage_core::{BillOfMaterials, BomLine, BomLineId, Product, ProductId, SalesLine};

use crate::pipeline::{ErpSource, ProductQuery};

use super::OdooError;
use super::client::OdooClient;
use super::records::{
    BOM_FIELDS, BOM_LINE_FIELDS, BomLineRecord, BomRecord, PRODUCT_FIELDS, ProductRecord,
    SALE_LINE_FIELDS, SaleLineRecord,
};

const PRODUCT_MODEL: &str = "product.product";
const BOM_MODEL: &str = "mrp.bom";
const BOM_LINE_MODEL: &str = "mrp.bom.line";
const SALE_LINE_MODEL: &str = "sale.order.line";

/// Sales order states counted as sold: confirmed and locked.
const SOLD_STATES: &[&str] = &["sale", "done"];

impl ErpSource for OdooClient {
    #[instrument(skip(self))]
    async fn search_products(&self, query: &ProductQuery) -> Result<Vec<Product>, OdooError> {
        let records: Vec<ProductRecord> = self
            .search_read(PRODUCT_MODEL, product_domain(query), PRODUCT_FIELDS, None)
            .await?;
        Ok(records.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn find_bill_of_materials(
        &self,
        product: &Product,
    ) -> Result<Option<BillOfMaterials>, OdooError> {
        let records: Vec<BomRecord> = self
            .search_read(BOM_MODEL, bom_domain(product), BOM_FIELDS, Some(1))
            .await?;
        Ok(records.into_iter().next().map(BillOfMaterials::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn read_bom_lines(&self, ids: &[BomLineId]) -> Result<Vec<BomLine>, OdooError> {
        let ids: Vec<i64> = ids.iter().map(BomLineId::as_i64).collect();
        let records: Vec<BomLineRecord> = self.read(BOM_LINE_MODEL, &ids, BOM_LINE_FIELDS).await?;
        Ok(records
            .into_iter()
            .filter_map(BomLineRecord::into_line)
            .collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn read_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, OdooError> {
        let ids: Vec<i64> = ids.iter().map(ProductId::as_i64).collect();
        let records: Vec<ProductRecord> = self.read(PRODUCT_MODEL, &ids, PRODUCT_FIELDS).await?;
        Ok(records.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self, products), fields(count = products.len(), since = %since))]
    async fn search_sales_lines(
        &self,
        products: &[ProductId],
        since: NaiveDate,
    ) -> Result<Vec<SalesLine>, OdooError> {
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<SaleLineRecord> = self
            .search_read(
                SALE_LINE_MODEL,
                sales_domain(products, since),
                SALE_LINE_FIELDS,
                None,
            )
            .await?;
        Ok(records
            .into_iter()
            .filter_map(SaleLineRecord::into_line)
            .collect())
    }
}

/// Name (or name-or-SKU) `ilike` domain.
fn product_domain(query: &ProductQuery) -> Value {
    if query.match_sku {
        json!([
            "|",
            ["name", "ilike", query.term],
            ["default_code", "ilike", query.term]
        ])
    } else {
        json!([["name", "ilike", query.term]])
    }
}

/// BOMs attached to the variant, or to its template without a variant.
fn bom_domain(product: &Product) -> Value {
    match product.template_id {
        Some(template) => json!([
            "|",
            ["product_id", "=", product.id.as_i64()],
            "&",
            ["product_id", "=", false],
            ["product_tmpl_id", "=", template.as_i64()]
        ]),
        None => json!([["product_id", "=", product.id.as_i64()]]),
    }
}

fn sales_domain(products: &[ProductId], since: NaiveDate) -> Value {
    let ids: Vec<i64> = products.iter().map(ProductId::as_i64).collect();
    json!([
        ["product_id", "in", ids],
        ["state", "in", SOLD_STATES],
        ["create_date", ">=", since.format("%Y-%m-%d").to_string()]
    ])
}
