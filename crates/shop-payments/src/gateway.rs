//! # Redirect Gateway Strategies
//!
//! Online strategy: builds a signed approval URL the customer is redirected
//! to, then confirms settlement through a signed callback. The gateway
//! protocol itself lives behind this seam — the strategy only owns URL
//! construction and callback verification.

use crate::config::GatewayConfig;
use crate::sign::{compute_hmac_sha256, constant_time_compare, parse_signature_header};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use shop_core::{
    CallbackEvent, Order, OnlinePaymentStrategy, PaymentApproval, PaymentFlow, PaymentMethod,
    PaymentOutcome, PaymentStrategy, PaymentTransaction, ShopError, ShopResult,
};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Online payment via an external approval redirect. One instance per
/// method; CreditCard and Paypal both settle through this shape.
pub struct RedirectGatewayStrategy {
    method: PaymentMethod,
    config: GatewayConfig,
}

impl RedirectGatewayStrategy {
    pub fn new(method: PaymentMethod, config: GatewayConfig) -> ShopResult<Self> {
        if method.flow() != PaymentFlow::Online {
            return Err(ShopError::Configuration(format!(
                "{method} is not an online method"
            )));
        }
        Ok(Self { method, config })
    }
}

impl PaymentStrategy for RedirectGatewayStrategy {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    fn flow(&self) -> PaymentFlow {
        PaymentFlow::Online
    }
}

#[async_trait]
impl OnlinePaymentStrategy for RedirectGatewayStrategy {
    #[instrument(skip(self, transaction, _order), fields(txn = %transaction.id))]
    async fn begin_payment(
        &self,
        transaction: &PaymentTransaction,
        _order: &Order,
    ) -> ShopResult<PaymentApproval> {
        let provider_ref = format!("{}-{}", self.method.as_str(), Uuid::new_v4());
        let query = format!(
            "txn={}&method={}&amount={}&currency={}&ref={}",
            transaction.id,
            self.method.as_str(),
            transaction.amount.amount,
            transaction.amount.currency.as_str(),
            provider_ref,
        );
        let signature = compute_hmac_sha256(&self.config.callback_secret, &query);
        let approval_url = format!("{}/approve?{}&sig={}", self.config.base_url, query, signature);

        debug!("Built approval URL for transaction {}", transaction.id);

        Ok(PaymentApproval {
            approval_url,
            provider_ref,
        })
    }

    fn verify_callback(&self, payload: &[u8], signature: &str) -> ShopResult<CallbackEvent> {
        let sig_parts = parse_signature_header(signature)?;

        // Reject replayed callbacks outside the timestamp tolerance
        let now = Utc::now().timestamp();
        if (now - sig_parts.timestamp).abs() > self.config.signature_tolerance_secs {
            return Err(ShopError::SignatureVerification(
                "Timestamp outside tolerance".to_string(),
            ));
        }

        let signed_payload = format!(
            "{}.{}",
            sig_parts.timestamp,
            String::from_utf8_lossy(payload)
        );
        let expected = compute_hmac_sha256(&self.config.callback_secret, &signed_payload);
        let valid = sig_parts
            .signatures
            .iter()
            .any(|sig| constant_time_compare(sig, &expected));
        if !valid {
            return Err(ShopError::SignatureVerification(
                "Signature mismatch".to_string(),
            ));
        }

        let callback: GatewayCallback = serde_json::from_slice(payload)
            .map_err(|e| ShopError::CallbackParse(format!("Malformed callback body: {e}")))?;

        let outcome = match callback.status.as_str() {
            "settled" => PaymentOutcome::Settled {
                provider_ref: callback.provider_ref,
            },
            "failed" => PaymentOutcome::Failed {
                reason: callback
                    .reason
                    .unwrap_or_else(|| "declined by gateway".to_string()),
            },
            other => {
                return Err(ShopError::CallbackParse(format!(
                    "Unknown callback status: {other}"
                )))
            }
        };

        Ok(CallbackEvent {
            transaction_id: callback.transaction_id,
            outcome,
        })
    }
}

// =============================================================================
// Gateway wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GatewayCallback {
    transaction_id: String,
    status: String,
    #[serde(default)]
    provider_ref: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::{Currency, Price};

    fn strategy() -> RedirectGatewayStrategy {
        RedirectGatewayStrategy::new(
            PaymentMethod::CreditCard,
            GatewayConfig::new("https://gateway.example", "secret-0123456789"),
        )
        .unwrap()
    }

    fn sign(body: &str, secret: &str) -> String {
        let ts = Utc::now().timestamp();
        let sig = compute_hmac_sha256(secret, &format!("{ts}.{body}"));
        format!("t={ts},v1={sig}")
    }

    #[test]
    fn test_offline_method_rejected() {
        let result = RedirectGatewayStrategy::new(
            PaymentMethod::CashOnDelivery,
            GatewayConfig::new("https://gateway.example", "secret-0123456789"),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_approval_url_carries_transaction() {
        let txn = PaymentTransaction::open(
            Price::new(25.0, Currency::USD),
            PaymentMethod::CreditCard,
        );
        let order = Order::from_snapshots("u1", vec![], None, None, txn.id.clone());

        let approval = strategy().begin_payment(&txn, &order).await.unwrap();
        assert!(approval.approval_url.starts_with("https://gateway.example/approve?"));
        assert!(approval.approval_url.contains(&format!("txn={}", txn.id)));
        assert!(approval.approval_url.contains("sig="));
    }

    #[test]
    fn test_valid_callback_settles() {
        let body = r#"{"transaction_id":"t-1","status":"settled","provider_ref":"gw-9"}"#;
        let header = sign(body, "secret-0123456789");

        let event = strategy().verify_callback(body.as_bytes(), &header).unwrap();
        assert_eq!(event.transaction_id, "t-1");
        assert_eq!(
            event.outcome,
            PaymentOutcome::Settled {
                provider_ref: Some("gw-9".into())
            }
        );
    }

    #[test]
    fn test_failed_callback_carries_reason() {
        let body = r#"{"transaction_id":"t-1","status":"failed","reason":"card declined"}"#;
        let header = sign(body, "secret-0123456789");

        let event = strategy().verify_callback(body.as_bytes(), &header).unwrap();
        assert_eq!(
            event.outcome,
            PaymentOutcome::Failed {
                reason: "card declined".into()
            }
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = r#"{"transaction_id":"t-1","status":"settled"}"#;
        let header = sign(body, "some-other-secret");

        let err = strategy()
            .verify_callback(body.as_bytes(), &header)
            .unwrap_err();
        assert!(matches!(err, ShopError::SignatureVerification(_)));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let body = r#"{"transaction_id":"t-1","status":"settled"}"#;
        let ts = Utc::now().timestamp() - 3600;
        let sig = compute_hmac_sha256("secret-0123456789", &format!("{ts}.{body}"));
        let header = format!("t={ts},v1={sig}");

        let err = strategy()
            .verify_callback(body.as_bytes(), &header)
            .unwrap_err();
        assert!(matches!(err, ShopError::SignatureVerification(_)));
    }

    #[test]
    fn test_unknown_status_is_parse_error() {
        let body = r#"{"transaction_id":"t-1","status":"teleported"}"#;
        let header = sign(body, "secret-0123456789");

        let err = strategy()
            .verify_callback(body.as_bytes(), &header)
            .unwrap_err();
        assert!(matches!(err, ShopError::CallbackParse(_)));
    }
}
