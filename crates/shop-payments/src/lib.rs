//! # shop-payments
//!
//! Concrete payment strategies for storefront-rs and the one-time registry
//! assembly that partitions them by (method, flow) at startup.
//!
//! Online methods (credit card, PayPal) go through a signed redirect/approval
//! flow confirmed by an HMAC-verified callback; offline methods (cash on
//! delivery, bank transfer) settle synchronously at checkout.

pub mod config;
pub mod gateway;
pub mod offline;
mod sign;

pub use config::GatewayConfig;
pub use gateway::RedirectGatewayStrategy;
pub use offline::{BankTransferStrategy, CashOnDeliveryStrategy};

use shop_core::{PaymentMethod, PaymentStrategyRegistry, ShopResult};
use std::sync::Arc;

/// Assemble the default strategy table: every supported method registered in
/// its flow, duplicates rejected. Called once at process start; the registry
/// is immutable afterwards.
pub fn default_registry(config: &GatewayConfig) -> ShopResult<PaymentStrategyRegistry> {
    let mut registry = PaymentStrategyRegistry::new();

    registry.register_online(Arc::new(RedirectGatewayStrategy::new(
        PaymentMethod::CreditCard,
        config.clone(),
    )?))?;
    registry.register_online(Arc::new(RedirectGatewayStrategy::new(
        PaymentMethod::Paypal,
        config.clone(),
    )?))?;
    registry.register_offline(Arc::new(CashOnDeliveryStrategy))?;
    registry.register_offline(Arc::new(BankTransferStrategy))?;

    Ok(registry)
}
