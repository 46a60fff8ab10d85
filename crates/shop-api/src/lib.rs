//! # shop-api
//!
//! HTTP API layer for storefront-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Bearer-token session extraction
//! - REST endpoints for cart, checkout, orders, and catalog
//! - Signed payment-gateway callback handling
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/cart/items` | Add or replace a cart line |
//! | GET | `/cart/my-cart` | Get cart with stock warnings |
//! | PATCH | `/cart/sync-cart` | Replace cart with client snapshot |
//! | DELETE | `/cart/clear-cart` | Empty the cart |
//! | POST | `/order` | Checkout the cart |
//! | GET | `/order/:id` | Get an order |
//! | PATCH | `/order/:id/address` | Attach shipping address |
//! | POST | `/order/:id/cancel` | Cancel an order |
//! | POST | `/payment/callback/:method` | Gateway callback |
//! | GET | `/products` | List products |
//! | GET | `/products/:id` | Get product |

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{CurrentUser, SessionTable};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
