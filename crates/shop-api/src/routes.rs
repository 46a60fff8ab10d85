//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Cart (session required):
///   - POST   /cart/items - Add or replace a cart line
///   - GET    /cart/my-cart - Get cart with stock warnings
///   - PATCH  /cart/sync-cart - Replace cart with client snapshot
///   - DELETE /cart/clear-cart - Empty the cart
///
/// - Orders (session required):
///   - POST  /order - Checkout the cart
///   - GET   /order/{order_id} - Get one of the user's orders
///   - PATCH /order/{order_id}/address - Attach a shipping address
///   - POST  /order/{order_id}/cancel - Cancel and release stock
///
/// - Payments:
///   - POST /payment/callback/{method} - Signed gateway callback
///
/// - Catalog (public):
///   - GET /products - List products
///   - GET /products/{product_id} - Get product by ID
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - allow all origins for now
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cart_routes = Router::new()
        .route("/items", post(handlers::add_cart_item))
        .route("/my-cart", get(handlers::get_my_cart))
        .route("/sync-cart", patch(handlers::sync_cart))
        .route("/clear-cart", delete(handlers::clear_cart));

    // Order routes stay top-level: the collection route ("/order") and the
    // item routes share the prefix without a nested "/".
    let order_routes = Router::new()
        .route("/order", post(handlers::create_order))
        .route("/order/{order_id}", get(handlers::get_order))
        .route("/order/{order_id}/address", patch(handlers::add_order_address))
        .route("/order/{order_id}/cancel", post(handlers::cancel_order));

    // Callback route takes the raw body for signature verification
    let payment_routes = Router::new().route(
        "/callback/{method}",
        post(handlers::payment_callback),
    );

    let catalog_routes = Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/cart", cart_routes)
        .merge(order_routes)
        .nest("/payment", payment_routes)
        .merge(catalog_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
