//! # Error Types
//!
//! Typed error handling for the storefront checkout core.
//! All fallible operations return `Result<T, ShopError>`.

use crate::payment::{PaymentFlow, PaymentMethod};
use crate::stock::StockWarning;
use thiserror::Error;

/// Core error type for cart, checkout, and payment operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Entity missing or soft-deleted
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed input (bad quantity, empty address fields, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Checkout attempted against an empty cart
    #[error("Cart is empty")]
    EmptyCart,

    /// One or more cart lines cannot be satisfied at checkout.
    /// Carries the complete warning list so the caller can render
    /// every problem at once, not just the first.
    #[error("Insufficient stock for {} item(s)", warnings.len())]
    InsufficientStock { warnings: Vec<StockWarning> },

    /// No strategy registered for this method in the requested flow
    #[error("Unsupported payment method: {method} ({flow})")]
    UnsupportedPaymentMethod {
        method: PaymentMethod,
        flow: PaymentFlow,
    },

    /// Two strategies claimed the same (method, flow) slot at startup
    #[error("Duplicate payment strategy registration: {method} ({flow})")]
    DuplicateStrategy {
        method: PaymentMethod,
        flow: PaymentFlow,
    },

    /// No valid session/token on the request
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Operation conflicts with current entity state (e.g. cancelling a shipped order)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payment callback signature verification failed
    #[error("Callback signature verification failed: {0}")]
    SignatureVerification(String),

    /// Payment callback payload could not be parsed
    #[error("Callback parse error: {0}")]
    CallbackParse(String),

    /// Configuration errors (missing env vars, bad seed files)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::NotFound { .. } => 404,
            ShopError::Validation(_) => 400,
            ShopError::EmptyCart => 400,
            ShopError::InsufficientStock { .. } => 409,
            ShopError::UnsupportedPaymentMethod { .. } => 400,
            ShopError::DuplicateStrategy { .. } => 500,
            ShopError::Unauthenticated => 401,
            ShopError::Conflict(_) => 409,
            ShopError::SignatureVerification(_) => 401,
            ShopError::CallbackParse(_) => 400,
            ShopError::Configuration(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }

    /// Convenience constructor for missing/soft-deleted products
    pub fn product_not_found(id: impl Into<String>) -> Self {
        ShopError::NotFound {
            entity: "Product",
            id: id.into(),
        }
    }

    /// Convenience constructor for missing orders
    pub fn order_not_found(id: impl Into<String>) -> Self {
        ShopError::NotFound {
            entity: "Order",
            id: id.into(),
        }
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::{StockWarning, StockWarningKind};

    #[test]
    fn test_status_codes() {
        assert_eq!(ShopError::product_not_found("p1").status_code(), 404);
        assert_eq!(ShopError::Validation("bad qty".into()).status_code(), 400);
        assert_eq!(ShopError::EmptyCart.status_code(), 400);
        assert_eq!(ShopError::Unauthenticated.status_code(), 401);
        assert_eq!(
            ShopError::InsufficientStock { warnings: vec![] }.status_code(),
            409
        );
    }

    #[test]
    fn test_insufficient_stock_message_counts_warnings() {
        let err = ShopError::InsufficientStock {
            warnings: vec![
                StockWarning {
                    product_id: "p1".into(),
                    product_name: "Widget".into(),
                    kind: StockWarningKind::OutOfStock,
                    available: 0,
                },
                StockWarning {
                    product_id: "p2".into(),
                    product_name: "Gadget".into(),
                    kind: StockWarningKind::LimitedStock,
                    available: 1,
                },
            ],
        };
        assert_eq!(err.to_string(), "Insufficient stock for 2 item(s)");
    }
}
