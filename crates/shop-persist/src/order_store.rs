//! # Order Store
//!
//! Orders and their 1:1 payment transactions behind one lock, so a payment
//! callback's "update transaction, then order" is never observed half-done.

use shop_core::{Order, PaymentTransaction, ShopError, ShopResult};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    orders: HashMap<String, Order>,
    transactions: HashMap<String, PaymentTransaction>,
}

pub struct OrderStore {
    inner: RwLock<Inner>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Persist an order together with its transaction
    pub async fn insert(&self, order: Order, transaction: PaymentTransaction) {
        let mut inner = self.inner.write().await;
        inner
            .transactions
            .insert(transaction.id.clone(), transaction);
        inner.orders.insert(order.id.clone(), order);
    }

    /// Fetch an order scoped to its owner. Foreign orders are NotFound —
    /// ownership is not leaked through a different status.
    pub async fn get_for_user(&self, user_id: &str, order_id: &str) -> ShopResult<Order> {
        self.inner
            .read()
            .await
            .orders
            .get(order_id)
            .filter(|o| o.user_id == user_id)
            .cloned()
            .ok_or_else(|| ShopError::order_not_found(order_id))
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> ShopResult<PaymentTransaction> {
        self.inner
            .read()
            .await
            .transactions
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| ShopError::NotFound {
                entity: "PaymentTransaction",
                id: transaction_id.to_string(),
            })
    }

    /// Apply a mutation to an order under the store lock
    pub async fn update_order<R>(
        &self,
        order_id: &str,
        mutate: impl FnOnce(&mut Order) -> ShopResult<R>,
    ) -> ShopResult<R> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ShopError::order_not_found(order_id))?;
        mutate(order)
    }

    /// Apply a payment outcome to a transaction and its order in one step
    pub async fn update_transaction_and_order<R>(
        &self,
        transaction_id: &str,
        mutate: impl FnOnce(&mut PaymentTransaction, &mut Order) -> ShopResult<R>,
    ) -> ShopResult<R> {
        let mut inner = self.inner.write().await;
        let Inner {
            orders,
            transactions,
        } = &mut *inner;
        let transaction =
            transactions
                .get_mut(transaction_id)
                .ok_or_else(|| ShopError::NotFound {
                    entity: "PaymentTransaction",
                    id: transaction_id.to_string(),
                })?;
        let order = orders
            .get_mut(&transaction.order_id)
            .ok_or_else(|| ShopError::order_not_found(&transaction.order_id))?;
        mutate(transaction, order)
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::{Currency, OrderItem, PaymentMethod, Price, Product, TransactionStatus};

    fn sample() -> (Order, PaymentTransaction) {
        let product = Product::new("p1", "Widget", Price::new(10.0, Currency::USD), 5);
        let items = vec![OrderItem::from_product(&product, 2)];
        let mut txn = PaymentTransaction::open(
            Price::new(20.0, Currency::USD),
            PaymentMethod::CashOnDelivery,
        );
        let order = Order::from_snapshots("u1", items, None, None, txn.id.clone());
        txn.order_id = order.id.clone();
        (order, txn)
    }

    #[tokio::test]
    async fn test_order_is_scoped_to_owner() {
        let store = OrderStore::new();
        let (order, txn) = sample();
        let order_id = order.id.clone();
        store.insert(order, txn).await;

        assert!(store.get_for_user("u1", &order_id).await.is_ok());
        assert!(matches!(
            store.get_for_user("someone-else", &order_id).await,
            Err(ShopError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_transaction_and_order_update_together() {
        let store = OrderStore::new();
        let (order, txn) = sample();
        let (order_id, txn_id) = (order.id.clone(), txn.id.clone());
        store.insert(order, txn).await;

        store
            .update_transaction_and_order(&txn_id, |txn, order| {
                txn.status = TransactionStatus::Settled;
                order.mark_payment_settled()
            })
            .await
            .unwrap();

        let txn = store.get_transaction(&txn_id).await.unwrap();
        assert_eq!(txn.status, TransactionStatus::Settled);
        let order = store.get_for_user("u1", &order_id).await.unwrap();
        assert_eq!(order.status, shop_core::OrderStatus::Confirmed);
    }
}
