//! Brand filter to product list, with pack explosion for composite brands.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument};

use stock_coverage_core::{Product, ProductId};

use crate::config::{BrandConfig, PackExplosionConfig};
use crate::odoo::OdooError;

use super::{ErpSource, ProductQuery};

/// Resolves a brand filter into the products its report covers.
#[derive(Debug)]
pub struct ProductResolver<'a, E> {
    source: &'a E,
    pack: &'a PackExplosionConfig,
}

/// Position in the resolved list: a matched product kept as-is, or a BOM
/// component still to be read.
enum Slot {
    Direct(Product),
    Component(ProductId),
}

impl<'a, E: ErpSource> ProductResolver<'a, E> {
    /// Create a resolver over `source`.
    #[must_use]
    pub const fn new(source: &'a E, pack: &'a PackExplosionConfig) -> Self {
        Self { source, pack }
    }

    /// Products covered by `brand`, deduplicated by ID in encounter order.
    ///
    /// For composite brands every matched product with a bill-of-materials
    /// is replaced by its components, and pack references and excluded SKUs
    /// are dropped afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first `OdooError` raised by the source.
    #[instrument(skip(self, brand), fields(brand = %brand.name))]
    pub async fn resolve(&self, brand: &BrandConfig) -> Result<Vec<Product>, OdooError> {
        let query = ProductQuery {
            term: brand.name.clone(),
            match_sku: brand.match_sku,
        };
        let matched = self.source.search_products(&query).await?;
        debug!(matched = matched.len(), "Products matched brand filter");

        if !self.pack.is_composite(&brand.name) {
            return Ok(dedup_by_id(matched));
        }

        let exploded = self.explode(matched).await?;
        let before = exploded.len();
        let kept: Vec<Product> = exploded
            .into_iter()
            .filter(|product| self.keep_after_explosion(product))
            .collect();
        info!(
            resolved = kept.len(),
            dropped = before - kept.len(),
            "Exploded packs into components"
        );
        Ok(kept)
    }

    /// Replace products that have a bill-of-materials by their components.
    ///
    /// A product with a bill-of-materials is never kept itself, even when
    /// the bill has no component lines.
    ///
    /// Components are read in one batch once every BOM is known; the result
    /// keeps the order in which products and components were encountered.
    async fn explode(&self, matched: Vec<Product>) -> Result<Vec<Product>, OdooError> {
        let mut slots = Vec::with_capacity(matched.len());
        let mut component_ids = Vec::new();
        let mut seen_components = HashSet::new();

        for product in matched {
            let Some(bom) = self.source.find_bill_of_materials(&product).await? else {
                slots.push(Slot::Direct(product));
                continue;
            };

            let lines = self.source.read_bom_lines(&bom.line_ids).await?;
            if lines.is_empty() {
                debug!(
                    product_id = %product.id,
                    bom_id = %bom.id,
                    "Bill of materials has no component lines, dropping pack"
                );
                continue;
            }

            debug!(
                product_id = %product.id,
                bom_id = %bom.id,
                components = lines.len(),
                "Exploding pack"
            );
            for line in lines {
                if seen_components.insert(line.component) {
                    component_ids.push(line.component);
                    slots.push(Slot::Component(line.component));
                }
            }
        }

        let mut components: HashMap<ProductId, Product> = self
            .source
            .read_products(&component_ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let resolved = slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Direct(product) => Some(product),
                Slot::Component(id) => components.remove(&id),
            })
            .collect();
        Ok(dedup_by_id(resolved))
    }

    fn keep_after_explosion(&self, product: &Product) -> bool {
        if product.is_pack_reference() {
            return false;
        }
        product
            .normalized_sku()
            .is_none_or(|sku| !self.pack.is_excluded_sku(&sku))
    }
}

/// Keep the first product for every ID.
fn dedup_by_id(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::with_capacity(products.len());
    products
        .into_iter()
        .filter(|product| seen.insert(product.id))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use stock_coverage_core::{BillOfMaterials, BomId, BomLine, BomLineId, SalesLine};

    use super::*;

    fn product(id: i64, sku: &str, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            template_id: None,
            sku: Some(sku.to_string()),
            barcode: None,
            name: name.to_string(),
            stock: 1.0,
            pending: 0.0,
        }
    }

    #[derive(Default)]
    struct StubSource {
        matched: Vec<Product>,
        catalog: Vec<Product>,
        boms: HashMap<ProductId, (BomId, Vec<BomLine>)>,
        product_reads: RefCell<usize>,
    }

    impl StubSource {
        fn with_bom(mut self, pack: i64, bom: i64, components: &[i64]) -> Self {
            let lines = components
                .iter()
                .enumerate()
                .map(|(i, c)| BomLine {
                    id: BomLineId::new(bom * 100 + i64::try_from(i).unwrap()),
                    component: ProductId::new(*c),
                    quantity: 1.0,
                })
                .collect();
            self.boms
                .insert(ProductId::new(pack), (BomId::new(bom), lines));
            self
        }
    }

    impl ErpSource for StubSource {
        async fn search_products(&self, _query: &ProductQuery) -> Result<Vec<Product>, OdooError> {
            Ok(self.matched.clone())
        }

        async fn find_bill_of_materials(
            &self,
            product: &Product,
        ) -> Result<Option<BillOfMaterials>, OdooError> {
            Ok(self.boms.get(&product.id).map(|(id, lines)| BillOfMaterials {
                id: *id,
                line_ids: lines.iter().map(|l| l.id).collect(),
            }))
        }

        async fn read_bom_lines(&self, ids: &[BomLineId]) -> Result<Vec<BomLine>, OdooError> {
            Ok(self
                .boms
                .values()
                .flat_map(|(_, lines)| lines.iter().cloned())
                .filter(|l| ids.contains(&l.id))
                .collect())
        }

        async fn read_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, OdooError> {
            *self.product_reads.borrow_mut() += 1;
            Ok(self
                .catalog
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect())
        }

        async fn search_sales_lines(
            &self,
            _products: &[ProductId],
            _since: NaiveDate,
        ) -> Result<Vec<SalesLine>, OdooError> {
            Ok(Vec::new())
        }
    }

    fn composite(brand: &str, excluded: &[&str]) -> PackExplosionConfig {
        PackExplosionConfig {
            brands: vec![brand.to_string()],
            excluded_skus: excluded.iter().map(ToString::to_string).collect(),
        }
    }

    fn ids(products: &[Product]) -> Vec<i64> {
        products.iter().map(|p| p.id.as_i64()).collect()
    }

    #[tokio::test]
    async fn test_standard_path_dedups_and_keeps_packs() {
        let source = StubSource {
            matched: vec![
                product(1, "PACK-01", "Pack"),
                product(2, "A", "A"),
                product(1, "PACK-01", "Pack"),
            ],
            ..StubSource::default()
        }
        .with_bom(1, 10, &[2]);
        let pack = PackExplosionConfig::default();

        let resolved = ProductResolver::new(&source, &pack)
            .resolve(&BrandConfig::new("ACME"))
            .await
            .unwrap();

        assert_eq!(ids(&resolved), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_explodes_pack_into_components() {
        let source = StubSource {
            matched: vec![product(1, "P-1", "Pack P"), product(4, "Q", "Single Q")],
            catalog: vec![product(2, "C1", "Component 1"), product(3, "C2", "Component 2")],
            ..StubSource::default()
        }
        .with_bom(1, 10, &[2, 3]);
        let pack = composite("acme", &[]);

        let resolved = ProductResolver::new(&source, &pack)
            .resolve(&BrandConfig::new("ACME"))
            .await
            .unwrap();

        assert_eq!(ids(&resolved), vec![2, 3, 4]);
        assert_eq!(*source.product_reads.borrow(), 1);
    }

    #[tokio::test]
    async fn test_pack_with_empty_bom_is_dropped() {
        let source = StubSource {
            matched: vec![product(1, "P-1", "Pack P"), product(4, "Q", "Single Q")],
            ..StubSource::default()
        }
        .with_bom(1, 10, &[]);
        let pack = composite("ACME", &[]);

        let resolved = ProductResolver::new(&source, &pack)
            .resolve(&BrandConfig::new("ACME"))
            .await
            .unwrap();

        assert_eq!(ids(&resolved), vec![4]);
    }

    #[tokio::test]
    async fn test_exploded_pack_references_are_dropped() {
        let source = StubSource {
            matched: vec![product(1, "P-1", "Pack P"), product(4, "Q", "Single Q")],
            catalog: vec![
                product(2, "pack-c1", "Component 1"),
                product(3, "C2", "Component 2"),
            ],
            ..StubSource::default()
        }
        .with_bom(1, 10, &[2, 3]);
        let pack = composite("ACME", &[]);

        let resolved = ProductResolver::new(&source, &pack)
            .resolve(&BrandConfig::new("acme"))
            .await
            .unwrap();

        assert_eq!(ids(&resolved), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_shared_component_appears_once() {
        let source = StubSource {
            matched: vec![product(1, "P-1", "Pack 1"), product(5, "P-5", "Pack 5")],
            catalog: vec![product(2, "C1", "Shared"), product(3, "C2", "Other")],
            ..StubSource::default()
        }
        .with_bom(1, 10, &[2])
        .with_bom(5, 50, &[2, 3]);
        let pack = composite("ACME", &[]);

        let resolved = ProductResolver::new(&source, &pack)
            .resolve(&BrandConfig::new("ACME"))
            .await
            .unwrap();

        assert_eq!(ids(&resolved), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_excluded_skus_are_normalized() {
        let source = StubSource {
            matched: vec![product(1, " ref-1 ", "Special"), product(2, "B", "Regular")],
            ..StubSource::default()
        };
        let pack = composite("ACME", &["REF-1"]);

        let resolved = ProductResolver::new(&source, &pack)
            .resolve(&BrandConfig::new("ACME"))
            .await
            .unwrap();

        assert_eq!(ids(&resolved), vec![2]);
    }

    #[tokio::test]
    async fn test_composite_match_is_exact_not_substring() {
        let source = StubSource {
            matched: vec![product(1, "P-1", "Pack P")],
            catalog: vec![product(2, "C1", "Component 1")],
            ..StubSource::default()
        }
        .with_bom(1, 10, &[2]);
        let pack = composite("ACME", &[]);

        let resolved = ProductResolver::new(&source, &pack)
            .resolve(&BrandConfig::new("ACME PRO"))
            .await
            .unwrap();

        assert_eq!(ids(&resolved), vec![1]);
    }
}
