//! # Product Store
//!
//! In-memory product table. `Product.quantity` is the single most contended
//! resource in the system, so every checkout-time decrement goes through
//! `commit_reservation`, which checks and decrements all lines inside one
//! write-lock section: two checkouts racing for the last unit see exactly
//! one success, and a failing line leaves every quantity untouched.

use shop_core::stock;
use shop_core::{Product, ProductCatalog, ProductStatus, ShopError, ShopResult};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct ProductStore {
    products: RwLock<HashMap<String, Product>>,
}

impl ProductStore {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the store from a catalog (loaded from `config/products.toml`)
    pub fn from_catalog(catalog: ProductCatalog) -> Self {
        let map = catalog
            .products
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Self {
            products: RwLock::new(map),
        }
    }

    /// Insert or replace a product
    pub async fn upsert(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    /// Lookup gated on the soft-delete flag: deleted products are NotFound
    /// to all checkout logic.
    pub async fn get_non_deleted(&self, id: &str) -> ShopResult<Product> {
        self.products
            .read()
            .await
            .get(id)
            .filter(|p| !p.deleted)
            .cloned()
            .ok_or_else(|| ShopError::product_not_found(id))
    }

    /// All non-deleted products
    pub async fn list(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| !p.deleted)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    /// Atomically reserve stock for every line or none of them.
    ///
    /// Inside a single write section: re-resolve each product, evaluate all
    /// lines, and only if every line is satisfiable decrement the quantities.
    /// Returns the product snapshots taken at the instant of the decrement,
    /// which checkout turns into immutable order items.
    pub async fn commit_reservation(&self, lines: &[(String, u32)]) -> ShopResult<Vec<Product>> {
        let mut products = self.products.write().await;

        // Validation pass: nothing is mutated until every line passes.
        let mut warnings = Vec::new();
        for (product_id, quantity) in lines {
            let product = products
                .get(product_id)
                .filter(|p| !p.deleted)
                .ok_or_else(|| ShopError::product_not_found(product_id))?;
            if let Some(warning) = stock::check_stock_and_warn(product, *quantity) {
                warnings.push(warning);
            }
        }
        if !warnings.is_empty() {
            return Err(ShopError::InsufficientStock { warnings });
        }

        // Commit pass: snapshot then decrement, still under the write lock.
        let mut snapshots = Vec::with_capacity(lines.len());
        for (product_id, quantity) in lines {
            let product = products
                .get_mut(product_id)
                .ok_or_else(|| ShopError::product_not_found(product_id))?;
            snapshots.push(product.clone());
            product.quantity -= quantity;
            if product.quantity == 0 && product.status == ProductStatus::Available {
                product.status = ProductStatus::OutOfStock;
            }
        }
        Ok(snapshots)
    }

    /// Compensating release for a cancelled order: restore the decremented
    /// quantities. Never revives a discontinued product.
    pub async fn release(&self, lines: &[(String, u32)]) {
        let mut products = self.products.write().await;
        for (product_id, quantity) in lines {
            if let Some(product) = products.get_mut(product_id.as_str()) {
                product.quantity += quantity;
                if product.status == ProductStatus::OutOfStock && product.quantity > 0 {
                    product.status = ProductStatus::Available;
                }
            }
        }
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::{Currency, Price, StockWarningKind};

    fn seeded() -> ProductStore {
        let mut catalog = ProductCatalog::new();
        catalog.add(Product::new(
            "a",
            "Product A",
            Price::new(10.0, Currency::USD),
            5,
        ));
        catalog.add(Product::new(
            "b",
            "Product B",
            Price::new(20.0, Currency::USD),
            1,
        ));
        ProductStore::from_catalog(catalog)
    }

    #[tokio::test]
    async fn test_soft_deleted_product_is_not_found() {
        let store = seeded();
        let mut product = store.get_non_deleted("a").await.unwrap();
        product.deleted = true;
        store.upsert(product).await;

        assert!(matches!(
            store.get_non_deleted("a").await,
            Err(ShopError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_reservation_failure_decrements_nothing() {
        let store = seeded();
        let lines = vec![("a".to_string(), 3), ("b".to_string(), 2)];

        let err = store.commit_reservation(&lines).await.unwrap_err();
        match err {
            ShopError::InsufficientStock { warnings } => {
                assert_eq!(warnings.len(), 1);
                assert_eq!(warnings[0].product_id, "b");
                assert_eq!(warnings[0].kind, StockWarningKind::LimitedStock);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Nothing moved, including the satisfiable line
        assert_eq!(store.get_non_deleted("a").await.unwrap().quantity, 5);
        assert_eq!(store.get_non_deleted("b").await.unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_reservation_decrements_all_lines() {
        let store = seeded();
        let lines = vec![("a".to_string(), 2), ("b".to_string(), 1)];

        let snapshots = store.commit_reservation(&lines).await.unwrap();
        assert_eq!(snapshots.len(), 2);
        // Snapshots carry pre-decrement state
        assert_eq!(snapshots[0].quantity, 5);

        assert_eq!(store.get_non_deleted("a").await.unwrap().quantity, 3);
        let b = store.get_non_deleted("b").await.unwrap();
        assert_eq!(b.quantity, 0);
        assert_eq!(b.status, ProductStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_release_restores_quantity_and_status() {
        let store = seeded();
        let lines = vec![("b".to_string(), 1)];
        store.commit_reservation(&lines).await.unwrap();

        store.release(&lines).await;
        let b = store.get_non_deleted("b").await.unwrap();
        assert_eq!(b.quantity, 1);
        assert_eq!(b.status, ProductStatus::Available);
    }

    #[tokio::test]
    async fn test_racing_reservations_for_last_unit() {
        let store = std::sync::Arc::new(seeded());
        let lines = vec![("b".to_string(), 1)];

        let first = {
            let store = store.clone();
            let lines = lines.clone();
            tokio::spawn(async move { store.commit_reservation(&lines).await })
        };
        let second = {
            let store = store.clone();
            let lines = lines.clone();
            tokio::spawn(async move { store.commit_reservation(&lines).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one reservation may win the last unit");
    }
}
