//! Newtype IDs for ERP record references.
//!
//! Odoo identifies every record by a positive integer that is only unique
//! within its model. Use the `define_id!` macro to create wrappers that
//! prevent passing a bill-of-materials line ID where a product ID is expected.

/// Macro to define a type-safe ERP record ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use stock_coverage_core::define_id;
/// define_id!(WarehouseId);
/// define_id!(LocationId);
///
/// let warehouse = WarehouseId::new(1);
/// let location = LocationId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: WarehouseId = location;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// `product.product` - a sellable variant, the unit stock is tracked on.
define_id!(ProductId);
// `product.template` - the template a variant belongs to.
define_id!(TemplateId);
// `mrp.bom`
define_id!(BomId);
// `mrp.bom.line`
define_id!(BomLineId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip_through_i64() {
        let id = ProductId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(ProductId::from(42), id);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(BomLineId::new(7).to_string(), "7");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&TemplateId::new(13)).expect("serialize");
        assert_eq!(json, "13");
    }
}
