//! # Cart Reconciliation
//!
//! Owns the authoritative cart-vs-request diff: applies a single added line
//! or a full client-submitted snapshot against server-side product truth,
//! recomputes totals, and aggregates fresh stock warnings. Every mutation for
//! one user runs under that user's cart lock.

use crate::cart_store::CartStore;
use crate::product_store::ProductStore;
use serde::Deserialize;
use shop_core::stock;
use shop_core::{
    Cart, CartItem, CartResponse, ShopError, ShopResult, StockWarning, StockWarningKind,
};
use std::sync::Arc;
use tracing::instrument;

/// One line of a client-submitted cart snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct SyncItem {
    pub product_id: String,
    pub quantity: u32,
}

pub struct CartService {
    products: Arc<ProductStore>,
    carts: Arc<CartStore>,
}

impl CartService {
    pub fn new(products: Arc<ProductStore>, carts: Arc<CartStore>) -> Self {
        Self { products, carts }
    }

    /// Add one line to the user's cart (lazily created). An existing line for
    /// the product has its quantity replaced by the request — the submitted
    /// quantity is authoritative, there is no merge-add. New lines snapshot
    /// the current product price.
    #[instrument(skip(self), fields(user = %user_id, product = %product_id))]
    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> ShopResult<CartItem> {
        if quantity == 0 {
            return Err(ShopError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        let product = self.products.get_non_deleted(product_id).await?;
        let item = CartItem::from_product(&product, quantity);

        let entry = self.carts.entry(user_id).await;
        let mut cart = entry.lock().await;
        cart.put_item(item.clone());
        Ok(item)
    }

    /// Replace the entire cart with a client-submitted snapshot.
    ///
    /// Every incoming line is resolved against server truth (missing or
    /// soft-deleted products fail the whole sync with NotFound) and gets its
    /// price re-snapshotted. Lines with unsatisfiable stock are still
    /// persisted with the requested quantity — the contract is "tell the
    /// user", not "silently clamp" — and surface in the response warnings.
    /// Duplicate product ids collapse, last occurrence winning.
    #[instrument(skip(self, items), fields(user = %user_id, lines = items.len()))]
    pub async fn sync_snapshot(
        &self,
        user_id: &str,
        items: &[SyncItem],
    ) -> ShopResult<CartResponse> {
        for item in items {
            if item.quantity == 0 {
                return Err(ShopError::Validation(format!(
                    "Quantity must be at least 1 (product {})",
                    item.product_id
                )));
            }
        }

        // Resolve everything before touching the cart so a NotFound cannot
        // leave a half-applied snapshot behind.
        let mut lines: Vec<CartItem> = Vec::with_capacity(items.len());
        for item in items {
            let product = self.products.get_non_deleted(&item.product_id).await?;
            let line = CartItem::from_product(&product, item.quantity);
            match lines.iter_mut().find(|l| l.product_id == line.product_id) {
                Some(existing) => *existing = line,
                None => lines.push(line),
            }
        }

        let entry = self.carts.entry(user_id).await;
        let mut cart = entry.lock().await;
        cart.replace_items(lines);
        self.respond(&cart).await
    }

    /// Authoritative read of the user's cart. Stock is re-evaluated per line
    /// against current product state — best-effort, no locks beyond the cart
    /// entry; warnings may be stale by the time the user acts, and checkout
    /// is where enforcement happens.
    pub async fn get_cart(&self, user_id: &str) -> ShopResult<CartResponse> {
        let entry = self.carts.entry(user_id).await;
        let cart = entry.lock().await;
        self.respond(&cart).await
    }

    /// Remove all lines; the cart row itself persists
    #[instrument(skip(self), fields(user = %user_id))]
    pub async fn clear(&self, user_id: &str) -> ShopResult<()> {
        let entry = self.carts.entry(user_id).await;
        entry.lock().await.clear();
        Ok(())
    }

    /// Build the authoritative response: fresh warnings per line, total over
    /// lines without a hard-blocking warning. Out-of-stock and discontinued
    /// lines stay visible in the item list but are excluded from the total;
    /// limited-stock lines still count.
    async fn respond(&self, cart: &Cart) -> ShopResult<CartResponse> {
        let mut warnings: Vec<StockWarning> = Vec::new();
        let mut excluded: Vec<String> = Vec::new();

        for item in cart.items() {
            let warning = match self.products.get_non_deleted(&item.product_id).await {
                Ok(product) => stock::check_stock_and_warn(&product, item.quantity),
                // Product vanished (soft-deleted) after the line was written:
                // non-purchasable, shown as discontinued
                Err(_) => Some(StockWarning {
                    product_id: item.product_id.clone(),
                    product_name: item.product_name.clone(),
                    kind: StockWarningKind::Discontinued,
                    available: 0,
                }),
            };
            if let Some(warning) = warning {
                if matches!(
                    warning.kind,
                    StockWarningKind::OutOfStock | StockWarningKind::Discontinued
                ) {
                    excluded.push(item.product_id.clone());
                }
                warnings.push(warning);
            }
        }

        Ok(CartResponse::build(cart, warnings, &excluded))
    }
}
