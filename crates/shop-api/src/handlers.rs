//! # Request Handlers
//!
//! Axum request handlers for the storefront API: cart, checkout, order
//! lifecycle, payment callbacks, and the product catalog.

use crate::auth::CurrentUser;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{Address, PaymentMethod, ShopError};
use shop_persist::{PlaceOrder, SyncItem};
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Add-to-cart request
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Product ID
    pub product_id: String,
    /// Quantity (sets the line, does not add to it)
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Full-cart sync request
#[derive(Debug, Deserialize)]
pub struct SyncCartRequest {
    /// Client-side cart snapshot; replaces the server cart wholesale
    #[serde(default)]
    pub items: Vec<SyncItem>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

fn shop_error_to_response(err: ShopError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code);

    // Surface the complete warning list so the client can render every
    // problem line, not just the first.
    if let ShopError::InsufficientStock { warnings } = &err {
        if let Ok(value) = serde_json::to_value(warnings) {
            response = response.with_details(serde_json::json!({ "warnings": value }));
        }
    }

    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Add or replace a single cart line
#[instrument(skip(state, request), fields(user = %user.0, product = %request.product_id))]
pub async fn add_cart_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<AddItemRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let item = state
        .carts
        .add_item(&user.0, &request.product_id, request.quantity)
        .await
        .map_err(shop_error_to_response)?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Get the authenticated user's cart with fresh stock warnings
pub async fn get_my_cart(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HandlerError> {
    let cart = state
        .carts
        .get_cart(&user.0)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(cart))
}

/// Replace the server cart with the client snapshot
#[instrument(skip(state, request), fields(user = %user.0, lines = request.items.len()))]
pub async fn sync_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<SyncCartRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let cart = state
        .carts
        .sync_snapshot(&user.0, &request.items)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(cart))
}

/// Empty the cart
#[instrument(skip(state), fields(user = %user.0))]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HandlerError> {
    state
        .carts
        .clear(&user.0)
        .await
        .map_err(shop_error_to_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Convert the cart into an order and dispatch payment
#[instrument(skip(state, request), fields(user = %user.0, method = %request.payment_method))]
pub async fn create_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<PlaceOrder>,
) -> Result<impl IntoResponse, HandlerError> {
    let outcome = state
        .checkout
        .create_order_from_cart(&user.0, request)
        .await
        .map_err(|e| {
            error!("Checkout failed: {}", e);
            shop_error_to_response(e)
        })?;

    info!(
        "Order {} created, status {:?}",
        outcome.order.id, outcome.order.status
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Fetch one of the user's orders
pub async fn get_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let order = state
        .checkout
        .get_order(&user.0, &order_id)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(order))
}

/// Attach a shipping address to an order placed without one
#[instrument(skip(state, address), fields(user = %user.0, order = %order_id))]
pub async fn add_order_address(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
    Json(address): Json<Address>,
) -> Result<impl IntoResponse, HandlerError> {
    let order = state
        .checkout
        .add_shipping_address(&user.0, &order_id, address)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(order))
}

/// Cancel an order and release its reserved stock
#[instrument(skip(state), fields(user = %user.0, order = %order_id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let order = state
        .checkout
        .cancel_order(&user.0, &order_id)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(order))
}

/// Handle a signed gateway callback for an online payment method
#[instrument(skip(state, headers, body), fields(method = %method))]
pub async fn payment_callback(
    State(state): State<AppState>,
    Path(method): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, HandlerError> {
    let method = PaymentMethod::parse(&method).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Unknown payment method: {}", method),
                400,
            )),
        )
    })?;

    let signature = headers
        .get("x-gateway-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing X-Gateway-Signature header", 400)),
            )
        })?;

    let strategy = state
        .strategies
        .get_online(method)
        .map_err(shop_error_to_response)?;

    let event = strategy.verify_callback(&body, signature).map_err(|e| {
        error!("Callback verification failed: {}", e);
        shop_error_to_response(e)
    })?;

    let order = state
        .checkout
        .apply_payment_outcome(&event)
        .await
        .map_err(shop_error_to_response)?;

    info!(
        "Callback applied: order {} now {:?}",
        order.id, order.status
    );
    Ok(StatusCode::OK)
}

/// List non-deleted products
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let products = state.products.list().await;
    Json(serde_json::json!({
        "products": products,
        "count": products.len()
    }))
}

/// Get a single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let product = state
        .products
        .get_non_deleted(&product_id)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::stock::{StockWarning, StockWarningKind};

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
        assert!(err.details.is_none());
    }

    #[test]
    fn test_shop_error_conversion() {
        let err = ShopError::Validation("Bad data".to_string());
        let (status, _json) = shop_error_to_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_insufficient_stock_carries_warnings() {
        let err = ShopError::InsufficientStock {
            warnings: vec![StockWarning {
                product_id: "p1".into(),
                product_name: "Widget".into(),
                kind: StockWarningKind::OutOfStock,
                available: 0,
            }],
        };
        let (status, Json(body)) = shop_error_to_response(err);
        assert_eq!(status, StatusCode::CONFLICT);

        let details = body.details.expect("warning details");
        let warnings = details["warnings"].as_array().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0]["product_id"], "p1");
    }
}
