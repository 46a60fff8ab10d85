//! # Payment Strategy Dispatch
//!
//! Strategy traits for payment handling, split into two capability sets:
//! online methods require an external approval redirect plus a later signed
//! callback, offline methods settle synchronously. The registry is a typed
//! lookup table from (method, flow) to a handler — it performs no payment
//! logic itself, is assembled once at process start, and is immutable
//! afterwards. Duplicate registrations are a startup error, never a runtime
//! ambiguity.

use crate::error::{ShopError, ShopResult};
use crate::order::{Order, PaymentTransaction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Payment methods accepted at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    CashOnDelivery,
    BankTransfer,
}

impl PaymentMethod {
    /// The capability set this method settles through
    pub fn flow(&self) -> PaymentFlow {
        match self {
            PaymentMethod::CreditCard | PaymentMethod::Paypal => PaymentFlow::Online,
            PaymentMethod::CashOnDelivery | PaymentMethod::BankTransfer => PaymentFlow::Offline,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    /// Parse the snake_case wire form (used in callback URLs)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "credit_card" => Some(PaymentMethod::CreditCard),
            "paypal" => Some(PaymentMethod::Paypal),
            "cash_on_delivery" => Some(PaymentMethod::CashOnDelivery),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strategy capability category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFlow {
    /// External redirect/approval flow with a later callback
    Online,
    /// Settled synchronously at checkout
    Offline,
}

impl std::fmt::Display for PaymentFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentFlow::Online => write!(f, "online"),
            PaymentFlow::Offline => write!(f, "offline"),
        }
    }
}

/// Result of invoking a strategy against a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Settled {
        #[serde(skip_serializing_if = "Option::is_none")]
        provider_ref: Option<String>,
    },
    Failed {
        reason: String,
    },
}

/// Approval handle returned by an online strategy: the caller redirects the
/// customer to `approval_url` and the gateway confirms through the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentApproval {
    pub approval_url: String,
    pub provider_ref: String,
}

/// Parsed, signature-verified payment callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackEvent {
    pub transaction_id: String,
    pub outcome: PaymentOutcome,
}

/// Identity shared by both strategy categories
pub trait PaymentStrategy: Send + Sync {
    /// The method this strategy settles
    fn method(&self) -> PaymentMethod;

    /// The capability set it belongs to
    fn flow(&self) -> PaymentFlow;
}

/// Online strategies build an external approval flow and later confirm it
/// through a signed callback.
#[async_trait]
pub trait OnlinePaymentStrategy: PaymentStrategy {
    /// Open the approval flow for a transaction. The transaction moves to
    /// AwaitingApproval; settlement happens when the callback arrives.
    async fn begin_payment(
        &self,
        transaction: &PaymentTransaction,
        order: &Order,
    ) -> ShopResult<PaymentApproval>;

    /// Verify a callback signature and parse the event
    fn verify_callback(&self, payload: &[u8], signature: &str) -> ShopResult<CallbackEvent>;
}

/// Offline strategies settle synchronously at checkout (cash on delivery,
/// bank transfer against an issued reference).
#[async_trait]
pub trait OfflinePaymentStrategy: PaymentStrategy {
    async fn settle(&self, transaction: &PaymentTransaction) -> ShopResult<PaymentOutcome>;
}

impl std::fmt::Debug for dyn OfflinePaymentStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflinePaymentStrategy")
            .field("method", &self.method())
            .finish()
    }
}

pub type BoxedOnlineStrategy = Arc<dyn OnlinePaymentStrategy>;
pub type BoxedOfflineStrategy = Arc<dyn OfflinePaymentStrategy>;

/// The (method, flow) -> strategy table. Built once at startup and treated
/// as immutable thereafter.
#[derive(Clone, Default)]
pub struct PaymentStrategyRegistry {
    online: HashMap<PaymentMethod, BoxedOnlineStrategy>,
    offline: HashMap<PaymentMethod, BoxedOfflineStrategy>,
}

impl PaymentStrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an online strategy. Fails fast on a duplicate slot.
    pub fn register_online(&mut self, strategy: BoxedOnlineStrategy) -> ShopResult<()> {
        let method = strategy.method();
        if self.online.insert(method, strategy).is_some() {
            return Err(ShopError::DuplicateStrategy {
                method,
                flow: PaymentFlow::Online,
            });
        }
        Ok(())
    }

    /// Register an offline strategy. Fails fast on a duplicate slot.
    pub fn register_offline(&mut self, strategy: BoxedOfflineStrategy) -> ShopResult<()> {
        let method = strategy.method();
        if self.offline.insert(method, strategy).is_some() {
            return Err(ShopError::DuplicateStrategy {
                method,
                flow: PaymentFlow::Offline,
            });
        }
        Ok(())
    }

    /// Resolve the online handler for a method
    pub fn get_online(&self, method: PaymentMethod) -> ShopResult<BoxedOnlineStrategy> {
        self.online
            .get(&method)
            .cloned()
            .ok_or(ShopError::UnsupportedPaymentMethod {
                method,
                flow: PaymentFlow::Online,
            })
    }

    /// Resolve the offline handler for a method
    pub fn get_offline(&self, method: PaymentMethod) -> ShopResult<BoxedOfflineStrategy> {
        self.offline
            .get(&method)
            .cloned()
            .ok_or(ShopError::UnsupportedPaymentMethod {
                method,
                flow: PaymentFlow::Offline,
            })
    }

    /// Confirm a method is dispatchable in its intrinsic flow without
    /// invoking anything — checkout resolves this before touching inventory.
    pub fn ensure_dispatchable(&self, method: PaymentMethod) -> ShopResult<()> {
        match method.flow() {
            PaymentFlow::Online => self.get_online(method).map(|_| ()),
            PaymentFlow::Offline => self.get_offline(method).map(|_| ()),
        }
    }

    /// Registered methods, partitioned by flow (for the health endpoint)
    pub fn methods(&self) -> (Vec<PaymentMethod>, Vec<PaymentMethod>) {
        (
            self.online.keys().copied().collect(),
            self.offline.keys().copied().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Currency, Price};

    struct FakeOffline(PaymentMethod);

    impl PaymentStrategy for FakeOffline {
        fn method(&self) -> PaymentMethod {
            self.0
        }
        fn flow(&self) -> PaymentFlow {
            PaymentFlow::Offline
        }
    }

    #[async_trait]
    impl OfflinePaymentStrategy for FakeOffline {
        async fn settle(&self, _transaction: &PaymentTransaction) -> ShopResult<PaymentOutcome> {
            Ok(PaymentOutcome::Settled { provider_ref: None })
        }
    }

    #[test]
    fn test_method_flow_partition() {
        assert_eq!(PaymentMethod::CreditCard.flow(), PaymentFlow::Online);
        assert_eq!(PaymentMethod::Paypal.flow(), PaymentFlow::Online);
        assert_eq!(PaymentMethod::CashOnDelivery.flow(), PaymentFlow::Offline);
        assert_eq!(PaymentMethod::BankTransfer.flow(), PaymentFlow::Offline);
    }

    #[test]
    fn test_method_wire_roundtrip() {
        for method in [
            PaymentMethod::CreditCard,
            PaymentMethod::Paypal,
            PaymentMethod::CashOnDelivery,
            PaymentMethod::BankTransfer,
        ] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::parse("carrier_pigeon"), None);
    }

    #[test]
    fn test_registry_duplicate_registration_fails() {
        let mut registry = PaymentStrategyRegistry::new();
        registry
            .register_offline(Arc::new(FakeOffline(PaymentMethod::CashOnDelivery)))
            .unwrap();
        let err = registry
            .register_offline(Arc::new(FakeOffline(PaymentMethod::CashOnDelivery)))
            .unwrap_err();
        assert!(matches!(err, ShopError::DuplicateStrategy { .. }));
    }

    #[test]
    fn test_registry_unregistered_method_is_unsupported() {
        let registry = PaymentStrategyRegistry::new();
        let err = registry.get_offline(PaymentMethod::BankTransfer).unwrap_err();
        assert!(matches!(err, ShopError::UnsupportedPaymentMethod { .. }));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_registered_offline_strategy_settles() {
        let mut registry = PaymentStrategyRegistry::new();
        registry
            .register_offline(Arc::new(FakeOffline(PaymentMethod::CashOnDelivery)))
            .unwrap();

        let strategy = registry.get_offline(PaymentMethod::CashOnDelivery).unwrap();
        let txn = PaymentTransaction::open(
            Price::new(10.0, Currency::USD),
            PaymentMethod::CashOnDelivery,
        );
        let outcome = strategy.settle(&txn).await.unwrap();
        assert!(matches!(outcome, PaymentOutcome::Settled { .. }));
    }
}
