//! # Offline Strategies
//!
//! Methods that settle synchronously at checkout: cash on delivery accepts
//! immediately and collects at the door; bank transfer issues the reference
//! the customer wires against.

use async_trait::async_trait;
use shop_core::{
    OfflinePaymentStrategy, PaymentFlow, PaymentMethod, PaymentOutcome, PaymentStrategy,
    PaymentTransaction, ShopResult,
};
use tracing::info;
use uuid::Uuid;

/// Cash on delivery: nothing moves until the courier does
pub struct CashOnDeliveryStrategy;

impl PaymentStrategy for CashOnDeliveryStrategy {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::CashOnDelivery
    }

    fn flow(&self) -> PaymentFlow {
        PaymentFlow::Offline
    }
}

#[async_trait]
impl OfflinePaymentStrategy for CashOnDeliveryStrategy {
    async fn settle(&self, transaction: &PaymentTransaction) -> ShopResult<PaymentOutcome> {
        let receipt = format!("cod-{}", Uuid::new_v4());
        info!(
            "COD accepted for transaction {}: {} due at delivery",
            transaction.id,
            transaction.amount.display()
        );
        Ok(PaymentOutcome::Settled {
            provider_ref: Some(receipt),
        })
    }
}

/// Bank transfer: settled against an issued wire reference
pub struct BankTransferStrategy;

impl PaymentStrategy for BankTransferStrategy {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::BankTransfer
    }

    fn flow(&self) -> PaymentFlow {
        PaymentFlow::Offline
    }
}

#[async_trait]
impl OfflinePaymentStrategy for BankTransferStrategy {
    async fn settle(&self, transaction: &PaymentTransaction) -> ShopResult<PaymentOutcome> {
        // Reference the customer quotes on the wire
        let reference = format!("BT-{}", &transaction.id[..8.min(transaction.id.len())]);
        info!(
            "Bank transfer reference {} issued for transaction {}",
            reference, transaction.id
        );
        Ok(PaymentOutcome::Settled {
            provider_ref: Some(reference),
        })
    }
}
