//! # Checkout Orchestration
//!
//! Converts a validated cart into an order: the payment strategy is resolved
//! before anything is touched, stock is reserved all-or-nothing, order items
//! are snapshotted at the instant of the decrement, and the cart is cleared
//! on success. Payment dispatch happens after the order exists; an online
//! method leaves the order in PendingPayment until the gateway callback, and
//! nothing auto-rolls-back reserved inventory — release is an explicit step
//! owned by order cancellation.

use crate::cart_store::CartStore;
use crate::notify::{OrderCompleted, OrderNotifier};
use crate::order_store::OrderStore;
use crate::product_store::ProductStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shop_core::{
    Address, CallbackEvent, Order, OrderItem, PaymentFlow, PaymentMethod, PaymentOutcome,
    PaymentStrategyRegistry, PaymentTransaction, Price, ShopError, ShopResult, TransactionStatus,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Checkout request: the payment method plus optional address and email
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

/// Result of a successful checkout. `approval_url` is present for online
/// methods — the caller redirects the customer there and the gateway
/// confirms through the payment callback.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub transaction: PaymentTransaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_url: Option<String>,
}

pub struct CheckoutService {
    products: Arc<ProductStore>,
    carts: Arc<CartStore>,
    orders: Arc<OrderStore>,
    strategies: Arc<PaymentStrategyRegistry>,
    notifier: Arc<dyn OrderNotifier>,
}

impl CheckoutService {
    pub fn new(
        products: Arc<ProductStore>,
        carts: Arc<CartStore>,
        orders: Arc<OrderStore>,
        strategies: Arc<PaymentStrategyRegistry>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            products,
            carts,
            orders,
            strategies,
            notifier,
        }
    }

    /// Convert the user's cart into an order.
    ///
    /// Fails whole (no partial order, no partial decrement) on: empty cart,
    /// unsupported payment method, any missing product, or any unsatisfiable
    /// line — the InsufficientStock error carries the complete warning list.
    #[instrument(skip(self, request), fields(user = %user_id, method = %request.payment_method))]
    pub async fn create_order_from_cart(
        &self,
        user_id: &str,
        request: PlaceOrder,
    ) -> ShopResult<CheckoutOutcome> {
        if let Some(address) = &request.shipping_address {
            if !address.is_complete() {
                return Err(ShopError::Validation(
                    "Shipping address is missing required fields".to_string(),
                ));
            }
        }
        // Resolve the strategy before any inventory effect so an unsupported
        // method cannot leave decremented stock behind.
        self.strategies
            .ensure_dispatchable(request.payment_method)?;

        // The cart lock serializes checkout against concurrent add/sync/clear
        // for this user.
        let entry = self.carts.entry(user_id).await;
        let mut cart = entry.lock().await;
        if cart.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        let lines: Vec<(String, u32)> = cart
            .items()
            .iter()
            .map(|i| (i.product_id.clone(), i.quantity))
            .collect();

        // All-or-nothing stock reservation; snapshots are the product state
        // at the instant of the decrement.
        let snapshots = self.products.commit_reservation(&lines).await?;

        let items: Vec<OrderItem> = snapshots
            .iter()
            .zip(lines.iter())
            .map(|(product, (_, quantity))| OrderItem::from_product(product, *quantity))
            .collect();
        let currency = items[0].unit_price.currency;
        let total_amount: i64 = items.iter().map(|i| i.total().amount).sum();

        let mut transaction = PaymentTransaction::open(
            Price::from_cents(total_amount, currency),
            request.payment_method,
        );
        let order = Order::from_snapshots(
            user_id,
            items,
            request.shipping_address,
            request.customer_email,
            transaction.id.clone(),
        );
        transaction.order_id = order.id.clone();

        self.orders.insert(order.clone(), transaction.clone()).await;
        cart.clear();
        drop(cart);

        info!(
            "Order {} created for {}: total={}, status={:?}",
            order.id,
            user_id,
            order.total.display(),
            order.status
        );

        let approval_url = self.dispatch_payment(&order, &transaction).await?;

        let order = self.orders.get_for_user(user_id, &order.id).await?;
        let transaction = self.orders.get_transaction(&transaction.id).await?;

        let event = OrderCompleted {
            order_id: order.id.clone(),
            total: order.total,
            customer_email: order.customer_email.clone(),
        };
        let notifier = self.notifier.clone();
        // Fire-and-forget: the mailer's problems are not checkout's problems
        tokio::spawn(async move { notifier.order_completed(event).await });

        Ok(CheckoutOutcome {
            order,
            transaction,
            approval_url,
        })
    }

    /// Invoke the resolved strategy and record its outcome. The order is
    /// already persisted; a failed or pending settlement never rolls back
    /// the reserved inventory.
    async fn dispatch_payment(
        &self,
        order: &Order,
        transaction: &PaymentTransaction,
    ) -> ShopResult<Option<String>> {
        match transaction.method.flow() {
            PaymentFlow::Offline => {
                let strategy = self.strategies.get_offline(transaction.method)?;
                let outcome = strategy.settle(transaction).await?;
                self.orders
                    .update_transaction_and_order(&transaction.id, |txn, order| {
                        apply_outcome(txn, order, &outcome, true)
                    })
                    .await?;
                Ok(None)
            }
            PaymentFlow::Online => {
                let strategy = self.strategies.get_online(transaction.method)?;
                let approval = strategy.begin_payment(transaction, order).await?;
                self.orders
                    .update_transaction_and_order(&transaction.id, |txn, order| {
                        txn.status = TransactionStatus::AwaitingApproval;
                        txn.provider_ref = Some(approval.provider_ref.clone());
                        txn.updated_at = Utc::now();
                        order.mark_awaiting_payment()
                    })
                    .await?;
                Ok(Some(approval.approval_url))
            }
        }
    }

    /// Apply a verified gateway callback to the transaction and its order
    #[instrument(skip(self, event), fields(txn = %event.transaction_id))]
    pub async fn apply_payment_outcome(&self, event: &CallbackEvent) -> ShopResult<Order> {
        self.orders
            .update_transaction_and_order(&event.transaction_id, |txn, order| {
                apply_outcome(txn, order, &event.outcome, false)?;
                Ok(order.clone())
            })
            .await
    }

    /// Attach a shipping address to an order; transitions PendingPayment to
    /// Processing once a complete address is present.
    pub async fn add_shipping_address(
        &self,
        user_id: &str,
        order_id: &str,
        address: Address,
    ) -> ShopResult<Order> {
        // Ownership check before mutation
        self.orders.get_for_user(user_id, order_id).await?;
        self.orders
            .update_order(order_id, |order| {
                order.attach_address(address)?;
                Ok(order.clone())
            })
            .await
    }

    /// Read-back of a user's order
    pub async fn get_order(&self, user_id: &str, order_id: &str) -> ShopResult<Order> {
        self.orders.get_for_user(user_id, order_id).await
    }

    /// Explicit cancellation with compensating inventory release. This is
    /// the only path that restores checkout-decremented stock.
    #[instrument(skip(self), fields(user = %user_id, order = %order_id))]
    pub async fn cancel_order(&self, user_id: &str, order_id: &str) -> ShopResult<Order> {
        let order = self.orders.get_for_user(user_id, order_id).await?;

        let cancelled = self
            .orders
            .update_transaction_and_order(&order.transaction_id, |txn, order| {
                order.cancel()?;
                if matches!(
                    txn.status,
                    TransactionStatus::Created | TransactionStatus::AwaitingApproval
                ) {
                    txn.status = TransactionStatus::Failed;
                    txn.updated_at = Utc::now();
                }
                Ok(order.clone())
            })
            .await?;

        let lines: Vec<(String, u32)> = cancelled
            .items
            .iter()
            .map(|i| (i.product_id.clone(), i.quantity))
            .collect();
        self.products.release(&lines).await;
        info!("Order {} cancelled, inventory released", cancelled.id);

        Ok(cancelled)
    }
}

/// Record a settlement outcome on the transaction and drive the order.
/// `offline` picks the offline transition (Processing once addressed) over
/// the online one (Confirmed).
fn apply_outcome(
    txn: &mut PaymentTransaction,
    order: &mut Order,
    outcome: &PaymentOutcome,
    offline: bool,
) -> ShopResult<()> {
    match outcome {
        PaymentOutcome::Settled { provider_ref } => {
            txn.status = TransactionStatus::Settled;
            if provider_ref.is_some() {
                txn.provider_ref = provider_ref.clone();
            }
            txn.updated_at = Utc::now();
            if offline {
                order.mark_offline_settled()
            } else {
                order.mark_payment_settled()
            }
        }
        PaymentOutcome::Failed { reason } => {
            warn!("Payment failed for order {}: {}", order.id, reason);
            txn.status = TransactionStatus::Failed;
            txn.updated_at = Utc::now();
            order.mark_payment_failed()
        }
    }
}
