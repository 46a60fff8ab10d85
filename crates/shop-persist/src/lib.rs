//! # shop-persist
//!
//! In-memory persistence collaborators and the two services that own the
//! checkout pipeline.
//!
//! This crate provides:
//! - `ProductStore` with the all-or-nothing stock reservation that prevents
//!   oversell
//! - `CartStore` with one async-mutex entry per user, serializing that
//!   user's cart mutations
//! - `OrderStore` holding orders and their payment transactions under one
//!   lock
//! - `CartService` — cart reconciliation (add, snapshot sync, read, clear)
//! - `CheckoutService` — cart-to-order conversion, payment dispatch,
//!   address attachment, cancellation with inventory release
//! - `OrderNotifier` — fire-and-forget order-completed events

pub mod cart_service;
pub mod cart_store;
pub mod checkout;
pub mod notify;
pub mod order_store;
pub mod product_store;

pub use cart_service::{CartService, SyncItem};
pub use cart_store::CartStore;
pub use checkout::{CheckoutOutcome, CheckoutService, PlaceOrder};
pub use notify::{LoggingNotifier, OrderCompleted, OrderNotifier, WebhookNotifier};
pub use order_store::OrderStore;
pub use product_store::ProductStore;
