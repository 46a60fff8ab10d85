//! # Order Types
//!
//! Order, order-item snapshots, and the 1:1 payment transaction.
//! Order items are immutable captures of product state at checkout time —
//! later product price changes never touch an existing order.

use crate::error::{ShopError, ShopResult};
use crate::payment::PaymentMethod;
use crate::product::{Currency, Price, Product};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle status.
///
/// Progression is monotonic, driven by payment outcome and fulfillment
/// events; the only regression is explicit cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    PendingPayment,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    PaymentFailed,
    Confirmed,
}

impl OrderStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Shipping address. Field-level validation happens upstream; this core only
/// cares that the required fields are non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub recipient: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Minimal completeness check: an order cannot proceed to fulfillment
    /// without a deliverable address.
    pub fn is_complete(&self) -> bool {
        !self.recipient.is_empty()
            && !self.street.is_empty()
            && !self.city.is_empty()
            && !self.country.is_empty()
    }
}

/// Immutable snapshot of one purchased line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at checkout time
    pub unit_price: Price,
    /// Discount percentage at checkout time
    pub discount_percent: u8,
}

impl OrderItem {
    /// Capture a line from the product state at the moment of checkout
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            discount_percent: product.discount_percent,
        }
    }

    /// Line total after discount: price x quantity x (100 - discount) / 100
    pub fn total(&self) -> Price {
        let gross = self.unit_price.amount * self.quantity as i64;
        Price {
            amount: gross * (100 - self.discount_percent.min(100)) as i64 / 100,
            currency: self.unit_price.currency,
        }
    }
}

/// An order created from a validated cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID (generated)
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Immutable item snapshots
    pub items: Vec<OrderItem>,

    /// Order total at checkout time
    pub total: Price,

    /// Lifecycle status
    pub status: OrderStatus,

    /// Shipping address, attached at checkout or as a separate step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,

    /// Customer email for the completion notification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// The 1:1 payment transaction id
    pub transaction_id: String,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last status change
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create an order from item snapshots. Status starts at `Pending` when
    /// a shipping address is present, `PendingPayment` otherwise — an order
    /// without an address cannot proceed to payment/fulfillment.
    pub fn from_snapshots(
        user_id: impl Into<String>,
        items: Vec<OrderItem>,
        shipping_address: Option<Address>,
        customer_email: Option<String>,
        transaction_id: impl Into<String>,
    ) -> Self {
        let currency = items
            .first()
            .map(|i| i.unit_price.currency)
            .unwrap_or(Currency::USD);
        let total_amount: i64 = items.iter().map(|i| i.total().amount).sum();
        let status = if shipping_address.is_some() {
            OrderStatus::Pending
        } else {
            OrderStatus::PendingPayment
        };
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            items,
            total: Price::from_cents(total_amount, currency),
            status,
            shipping_address,
            customer_email,
            transaction_id: transaction_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a shipping address. Transitions PendingPayment -> Processing
    /// once a complete address is present.
    pub fn attach_address(&mut self, address: Address) -> ShopResult<()> {
        if !address.is_complete() {
            return Err(ShopError::Validation(
                "Shipping address is missing required fields".to_string(),
            ));
        }
        if self.status.is_terminal() {
            return Err(ShopError::Conflict(format!(
                "Order {} is {:?} and can no longer change",
                self.id, self.status
            )));
        }
        self.shipping_address = Some(address);
        if self.status == OrderStatus::PendingPayment {
            self.status = OrderStatus::Processing;
        }
        self.touch();
        Ok(())
    }

    /// Online flow dispatched: the order waits on the gateway callback.
    pub fn mark_awaiting_payment(&mut self) -> ShopResult<()> {
        if self.status.is_terminal() {
            return Err(ShopError::Conflict(format!(
                "Order {} is {:?} and can no longer change",
                self.id, self.status
            )));
        }
        self.status = OrderStatus::PendingPayment;
        self.touch();
        Ok(())
    }

    /// Offline settlement at checkout: fulfillment starts once an address is
    /// present; without one the order holds at PendingPayment until
    /// `attach_address` unblocks it.
    pub fn mark_offline_settled(&mut self) -> ShopResult<()> {
        if self.status.is_terminal() {
            return Err(ShopError::Conflict(format!(
                "Order {} is {:?} and can no longer change",
                self.id, self.status
            )));
        }
        self.status = if self.shipping_address.is_some() {
            OrderStatus::Processing
        } else {
            OrderStatus::PendingPayment
        };
        self.touch();
        Ok(())
    }

    /// Payment settled: advance toward Confirmed. Never regresses a
    /// cancelled or already-delivered order.
    pub fn mark_payment_settled(&mut self) -> ShopResult<()> {
        if self.status.is_terminal() {
            return Err(ShopError::Conflict(format!(
                "Order {} is {:?}; payment outcome ignored",
                self.id, self.status
            )));
        }
        self.status = OrderStatus::Confirmed;
        self.touch();
        Ok(())
    }

    /// Payment failed: the order holds at PaymentFailed until an operator or
    /// cancellation resolves it. Inventory is not auto-released here.
    pub fn mark_payment_failed(&mut self) -> ShopResult<()> {
        if self.status.is_terminal() {
            return Err(ShopError::Conflict(format!(
                "Order {} is {:?}; payment outcome ignored",
                self.id, self.status
            )));
        }
        self.status = OrderStatus::PaymentFailed;
        self.touch();
        Ok(())
    }

    /// Explicit cancellation. Rejected once the order has shipped.
    pub fn cancel(&mut self) -> ShopResult<()> {
        match self.status {
            OrderStatus::Shipped | OrderStatus::Delivered => Err(ShopError::Conflict(format!(
                "Order {} has shipped and cannot be cancelled",
                self.id
            ))),
            OrderStatus::Cancelled => Err(ShopError::Conflict(format!(
                "Order {} is already cancelled",
                self.id
            ))),
            _ => {
                self.status = OrderStatus::Cancelled;
                self.touch();
                Ok(())
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Payment transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Opened at checkout, not yet dispatched
    Created,
    /// Online flow: approval URL issued, waiting on the gateway callback
    AwaitingApproval,
    /// Settled (offline synchronously, or online via callback)
    Settled,
    /// Declined or failed at the provider
    Failed,
}

/// 1:1 payment transaction for an order. Created at checkout with the
/// resolved amount and method; mutated only through the strategy outcome path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: String,
    pub order_id: String,
    pub amount: Price,
    pub method: PaymentMethod,
    pub status: TransactionStatus,
    /// Provider-side reference (approval id, receipt number, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// Open a transaction for an order-to-be. The order id is filled in by
    /// the orchestrator once the order exists.
    pub fn open(amount: Price, method: PaymentMethod) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: String::new(),
            amount,
            method,
            status: TransactionStatus::Created,
            provider_ref: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Currency, Price, Product};

    fn snapshot(price: f64, quantity: u32, discount: u8) -> OrderItem {
        let product = Product::new("p1", "Widget", Price::new(price, Currency::USD), 100)
            .with_discount(discount);
        OrderItem::from_product(&product, quantity)
    }

    fn address() -> Address {
        Address {
            recipient: "A. Customer".into(),
            street: "1 Main St".into(),
            city: "Springfield".into(),
            postal_code: "12345".into(),
            country: "US".into(),
        }
    }

    #[test]
    fn test_order_item_total_applies_discount() {
        // $10.00 x 2 x (1 - 0.25) = $15.00
        assert_eq!(snapshot(10.0, 2, 25).total().amount, 1500);
        assert_eq!(snapshot(10.0, 2, 0).total().amount, 2000);
    }

    #[test]
    fn test_order_status_depends_on_address() {
        let with = Order::from_snapshots("u1", vec![snapshot(10.0, 1, 0)], Some(address()), None, "t1");
        assert_eq!(with.status, OrderStatus::Pending);

        let without = Order::from_snapshots("u1", vec![snapshot(10.0, 1, 0)], None, None, "t1");
        assert_eq!(without.status, OrderStatus::PendingPayment);
    }

    #[test]
    fn test_attach_address_advances_pending_payment() {
        let mut order = Order::from_snapshots("u1", vec![snapshot(10.0, 1, 0)], None, None, "t1");
        order.attach_address(address()).unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[test]
    fn test_attach_incomplete_address_rejected() {
        let mut order = Order::from_snapshots("u1", vec![snapshot(10.0, 1, 0)], None, None, "t1");
        let result = order.attach_address(Address::default());
        assert!(matches!(result, Err(ShopError::Validation(_))));
        assert_eq!(order.status, OrderStatus::PendingPayment);
    }

    #[test]
    fn test_payment_outcome_never_regresses_cancelled_order() {
        let mut order = Order::from_snapshots("u1", vec![snapshot(10.0, 1, 0)], None, None, "t1");
        order.cancel().unwrap();
        assert!(order.mark_payment_settled().is_err());
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_cannot_cancel_shipped_order() {
        let mut order = Order::from_snapshots("u1", vec![snapshot(10.0, 1, 0)], Some(address()), None, "t1");
        order.status = OrderStatus::Shipped;
        assert!(order.cancel().is_err());
    }

    #[test]
    fn test_order_total_sums_discounted_lines() {
        let order = Order::from_snapshots(
            "u1",
            vec![snapshot(10.0, 2, 50), snapshot(5.0, 1, 0)],
            None,
            None,
            "t1",
        );
        // 1000*2*0.5 + 500 = 1500
        assert_eq!(order.total.amount, 1500);
    }
}
