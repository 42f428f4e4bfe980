//! One-level bill-of-materials records.

use serde::{Deserialize, Serialize};

use super::id::{BomId, BomLineId, ProductId};

/// A bill-of-materials header: which lines make up a composite product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillOfMaterials {
    /// BOM identifier.
    pub id: BomId,
    /// Component lines, in ERP order.
    pub line_ids: Vec<BomLineId>,
}

/// One component line of a bill-of-materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    /// Line identifier.
    pub id: BomLineId,
    /// Component product.
    pub component: ProductId,
    /// Units of the component per composite unit.
    pub quantity: f64,
}
