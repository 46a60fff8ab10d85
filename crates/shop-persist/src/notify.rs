//! # Order Notifications
//!
//! Fire-and-forget order-completed events for the external mailer. A failed
//! notification is logged and dropped — it must never fail the checkout that
//! triggered it.

use async_trait::async_trait;
use serde::Serialize;
use shop_core::Price;
use tracing::{error, info};

/// Event payload for a completed checkout
#[derive(Debug, Clone, Serialize)]
pub struct OrderCompleted {
    pub order_id: String,
    pub total: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
}

/// Outbound notification seam. Consumed asynchronously; implementations must
/// swallow their own failures.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn order_completed(&self, event: OrderCompleted);
}

/// Default notifier: just logs the event
pub struct LoggingNotifier;

#[async_trait]
impl OrderNotifier for LoggingNotifier {
    async fn order_completed(&self, event: OrderCompleted) {
        info!(
            "Order completed: id={}, total={}, email={:?}",
            event.order_id,
            event.total.display(),
            event.customer_email
        );
    }
}

/// Posts the event as JSON to a configured webhook (the mailer's inbox)
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl OrderNotifier for WebhookNotifier {
    async fn order_completed(&self, event: OrderCompleted) {
        match self.client.post(&self.url).json(&event).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Order notification delivered: {}", event.order_id);
            }
            Ok(resp) => {
                error!(
                    "Order notification rejected: order={}, status={}",
                    event.order_id,
                    resp.status()
                );
            }
            Err(e) => {
                error!(
                    "Order notification failed: order={}, error={}",
                    event.order_id, e
                );
            }
        }
    }
}
