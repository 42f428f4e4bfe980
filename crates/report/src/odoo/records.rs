//! Raw Odoo records and their conversion into domain types.
//!
//! Odoo serializes empty scalar fields as `false` rather than `null`, and
//! many2one fields as `[id, "display name"]`. The records here decode both
//! and convert into `stock_coverage_core` types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

use stock_coverage_core::{
    BillOfMaterials, BomId, BomLine, BomLineId, Product, ProductId, SalesLine, TemplateId,
};

/// Fields read from `product.product`.
pub const PRODUCT_FIELDS: &[&str] = &[
    "id",
    "product_tmpl_id",
    "default_code",
    "barcode",
    "name",
    "qty_available",
    "incoming_qty",
];

/// Fields read from `mrp.bom`.
pub const BOM_FIELDS: &[&str] = &["id", "bom_line_ids"];

/// Fields read from `mrp.bom.line`.
pub const BOM_LINE_FIELDS: &[&str] = &["id", "product_id", "product_qty"];

/// Fields read from `sale.order.line`.
pub const SALE_LINE_FIELDS: &[&str] = &["product_id", "product_uom_qty", "create_date"];

/// Shown when the ERP record has no name.
const MISSING_NAME: &str = "-";

/// Odoo server datetime format.
const ODOO_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A many2one value: `[id, "display name"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Many2One(pub i64, pub String);

/// A `product.product` record.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "false_as_none")]
    pub product_tmpl_id: Option<Many2One>,
    #[serde(default, deserialize_with = "false_as_none")]
    pub default_code: Option<String>,
    #[serde(default, deserialize_with = "false_as_none")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "false_as_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub qty_available: f64,
    #[serde(default)]
    pub incoming_qty: f64,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: ProductId::new(record.id),
            template_id: record.product_tmpl_id.map(|t| TemplateId::new(t.0)),
            sku: record.default_code,
            barcode: record.barcode,
            name: record.name.unwrap_or_else(|| MISSING_NAME.to_string()),
            stock: record.qty_available,
            pending: record.incoming_qty,
        }
    }
}

/// An `mrp.bom` record.
#[derive(Debug, Clone, Deserialize)]
pub struct BomRecord {
    pub id: i64,
    #[serde(default)]
    pub bom_line_ids: Vec<i64>,
}

impl From<BomRecord> for BillOfMaterials {
    fn from(record: BomRecord) -> Self {
        Self {
            id: BomId::new(record.id),
            line_ids: record.bom_line_ids.into_iter().map(BomLineId::new).collect(),
        }
    }
}

/// An `mrp.bom.line` record.
#[derive(Debug, Clone, Deserialize)]
pub struct BomLineRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "false_as_none")]
    pub product_id: Option<Many2One>,
    #[serde(default)]
    pub product_qty: f64,
}

impl BomLineRecord {
    /// Convert into a domain line; `None` when the line has no component.
    #[must_use]
    pub fn into_line(self) -> Option<BomLine> {
        let component = self.product_id?;
        Some(BomLine {
            id: BomLineId::new(self.id),
            component: ProductId::new(component.0),
            quantity: self.product_qty,
        })
    }
}

/// A `sale.order.line` record.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleLineRecord {
    #[serde(default, deserialize_with = "false_as_none")]
    pub product_id: Option<Many2One>,
    #[serde(default)]
    pub product_uom_qty: f64,
    #[serde(deserialize_with = "odoo_datetime")]
    pub create_date: NaiveDateTime,
}

impl SaleLineRecord {
    /// Convert into a domain line; `None` for lines without a product
    /// (section and note lines).
    #[must_use]
    pub fn into_line(self) -> Option<SalesLine> {
        let product = self.product_id?;
        Some(SalesLine {
            product_id: ProductId::new(product.0),
            quantity: self.product_uom_qty,
            created_at: self.create_date,
        })
    }
}

/// Deserialize an optional Odoo field where "empty" is encoded as `false`.
fn false_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field<T> {
        Value(T),
        Flag(bool),
    }

    Ok(match Option::<Field<T>>::deserialize(deserializer)? {
        Some(Field::Value(value)) => Some(value),
        Some(Field::Flag(_)) | None => None,
    })
}

/// Deserialize an Odoo datetime string (`YYYY-MM-DD HH:MM:SS[.ffffff]`).
fn odoo_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_odoo_datetime(&raw).map_err(serde::de::Error::custom)
}

fn parse_odoo_datetime(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, ODOO_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
}
