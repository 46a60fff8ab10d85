//! # Cart Aggregate
//!
//! One cart per user, created lazily on first access and never deleted;
//! only its items churn. The cart owns its items: `put_item`,
//! `replace_items`, and `clear` are the only sanctioned mutations.

use crate::product::{Currency, Price, Product};
use crate::stock::StockWarning;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line in a cart. Unique by product within the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product reference
    pub product_id: String,

    /// Product name (denormalized for display)
    pub product_name: String,

    /// Requested quantity (>= 1)
    pub quantity: u32,

    /// Unit price snapshotted when the line was last written
    pub unit_price: Price,

    /// When the line was last written
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Snapshot a line from the current product state
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            added_at: Utc::now(),
        }
    }

    /// Line total at the snapshotted price
    pub fn line_total(&self) -> Price {
        Price {
            amount: self.unit_price.amount * self.quantity as i64,
            currency: self.unit_price.currency,
        }
    }
}

/// A user's cart. 1:1 with the user; lives for the user's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID (generated once, stable across item churn)
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Lines, unique by product
    items: Vec<CartItem>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart for a user
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by product
    pub fn item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Insert or replace the line for a product.
    ///
    /// An existing line's quantity is overwritten with the request — the
    /// submitted quantity is authoritative, there is no merge-add.
    pub fn put_item(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
        self.updated_at = Utc::now();
    }

    /// Replace the entire item set with a new snapshot.
    /// Existing lines that do not appear in the snapshot are removed.
    pub fn replace_items(&mut self, items: Vec<CartItem>) {
        self.items = items;
        self.updated_at = Utc::now();
    }

    /// Remove all lines. The cart row itself persists.
    pub fn clear(&mut self) {
        self.items.clear();
        self.updated_at = Utc::now();
    }
}

/// One line of a `CartResponse`, with its current stock evaluation folded in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Authoritative cart view returned by every cart operation.
///
/// `total` covers only lines without a hard-blocking warning — out-of-stock
/// and discontinued lines stay visible in `items` but are excluded from the
/// sum. Warnings are re-derived from live product state on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub cart_id: String,
    pub user_id: String,
    pub items: Vec<CartLineView>,
    pub total: Price,
    pub warnings: Vec<StockWarning>,
}

impl CartResponse {
    /// Build a response from cart lines and their freshly evaluated warnings.
    /// `excluded` lists the product ids whose lines are dropped from the total.
    pub fn build(cart: &Cart, warnings: Vec<StockWarning>, excluded: &[String]) -> Self {
        let currency = cart
            .items
            .first()
            .map(|i| i.unit_price.currency)
            .unwrap_or(Currency::USD);

        let items: Vec<CartLineView> = cart
            .items
            .iter()
            .map(|i| CartLineView {
                product_id: i.product_id.clone(),
                product_name: i.product_name.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price,
                line_total: i.line_total(),
            })
            .collect();

        let total_amount: i64 = cart
            .items
            .iter()
            .filter(|i| !excluded.contains(&i.product_id))
            .map(|i| i.line_total().amount)
            .sum();

        Self {
            cart_id: cart.id.clone(),
            user_id: cart.user_id.clone(),
            items,
            total: Price::from_cents(total_amount, currency),
            warnings,
        }
    }
}
