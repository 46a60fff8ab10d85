//! # shop-core
//!
//! Core domain types and checkout logic for storefront-rs.
//!
//! This crate provides:
//! - `Product`, `Price`, and the TOML-seeded `ProductCatalog`
//! - The `Cart` aggregate and its authoritative `CartResponse` view
//! - The pure stock evaluator (`evaluate`, `check_stock_and_warn`)
//! - `Order`/`OrderItem` snapshots and the 1:1 `PaymentTransaction`
//! - Payment strategy traits and the `PaymentStrategyRegistry`
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{stock, Cart, CartItem, Product, Price, Currency};
//!
//! let product = Product::new("mug", "Ember Mug", Price::new(20.0, Currency::USD), 5);
//!
//! // Warn when a request outruns stock
//! assert!(stock::check_stock_and_warn(&product, 8).is_some());
//!
//! let mut cart = Cart::new("user-1");
//! cart.put_item(CartItem::from_product(&product, 2));
//! ```

pub mod cart;
pub mod error;
pub mod order;
pub mod payment;
pub mod product;
pub mod stock;

// Re-exports for convenience
pub use cart::{Cart, CartItem, CartLineView, CartResponse};
pub use error::{ShopError, ShopResult};
pub use order::{
    Address, Order, OrderItem, OrderStatus, PaymentTransaction, TransactionStatus,
};
pub use payment::{
    BoxedOfflineStrategy, BoxedOnlineStrategy, CallbackEvent, OfflinePaymentStrategy,
    OnlinePaymentStrategy, PaymentApproval, PaymentFlow, PaymentMethod, PaymentOutcome,
    PaymentStrategy, PaymentStrategyRegistry,
};
pub use product::{Currency, Price, Product, ProductCatalog, ProductStatus};
pub use stock::{StockStatus, StockWarning, StockWarningKind};
