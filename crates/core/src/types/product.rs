//! Product snapshot as read from the ERP.

use serde::{Deserialize, Serialize};

use super::id::{ProductId, TemplateId};

/// A tracked product variant with its stock levels.
///
/// Snapshot of the ERP state at fetch time. Stock figures are in the
/// product's unit of measure and may be fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// ERP identifier of the variant.
    pub id: ProductId,
    /// Template the variant belongs to (bill-of-materials are usually
    /// attached to the template).
    pub template_id: Option<TemplateId>,
    /// Internal reference.
    pub sku: Option<String>,
    /// EAN/UPC barcode.
    pub barcode: Option<String>,
    /// Display name.
    pub name: String,
    /// Quantity on hand.
    pub stock: f64,
    /// Quantity expected from incoming receipts.
    pub pending: f64,
}

impl Product {
    /// Prefix identifying pack-level references.
    pub const PACK_PREFIX: &'static str = "PACK";

    /// Whether the SKU or the name starts with `PACK`, ignoring case.
    #[must_use]
    pub fn is_pack_reference(&self) -> bool {
        self.sku
            .as_deref()
            .is_some_and(|sku| starts_with_ignore_case(sku, Self::PACK_PREFIX))
            || starts_with_ignore_case(&self.name, Self::PACK_PREFIX)
    }

    /// SKU trimmed and uppercased, for comparison against exclusion lists.
    #[must_use]
    pub fn normalized_sku(&self) -> Option<String> {
        self.sku.as_deref().map(|sku| sku.trim().to_uppercase())
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(sku: Option<&str>, name: &str) -> Product {
        Product {
            id: ProductId::new(1),
            template_id: None,
            sku: sku.map(String::from),
            barcode: None,
            name: name.to_string(),
            stock: 0.0,
            pending: 0.0,
        }
    }

    #[test]
    fn test_pack_reference_by_sku() {
        assert!(product(Some("pack-001"), "Cable").is_pack_reference());
        assert!(product(Some("PACK001"), "Cable").is_pack_reference());
        assert!(!product(Some("XPACK"), "Cable").is_pack_reference());
    }

    #[test]
    fn test_pack_reference_by_name() {
        assert!(product(Some("CB-1"), "Pack 3 cables").is_pack_reference());
        assert!(!product(None, "Cable pack").is_pack_reference());
    }

    #[test]
    fn test_pack_reference_short_and_multibyte_names() {
        assert!(!product(None, "PA").is_pack_reference());
        assert!(!product(None, "Pñck").is_pack_reference());
    }

    #[test]
    fn test_normalized_sku() {
        assert_eq!(
            product(Some(" ab-12 "), "Cable").normalized_sku().as_deref(),
            Some("AB-12")
        );
        assert_eq!(product(None, "Cable").normalized_sku(), None);
    }
}
