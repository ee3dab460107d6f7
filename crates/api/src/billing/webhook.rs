//! Webhook signature verification and event classification.
//!
//! The provider signs deliveries with an HMAC-SHA256 over
//! `"{timestamp}.{body}"`, carried in a header shaped like
//! `t=1700000000,v1=<hex digest>`. Verification is a hard gate: a missing
//! secret or a bad signature rejects the delivery with HTTP 400 before any
//! processing.
//!
//! There is no dedup ledger and no ordering guarantee; redelivered events
//! are harmless because every update they trigger is a pure overwrite.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;

use nixe_core::OrderId;

/// Maximum accepted clock skew between the signed timestamp and now.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Metadata key carrying the local order ID.
const ORDER_ID_KEY: &str = "orderID";

/// Errors that can occur verifying a webhook delivery.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Signature header missing or malformed.
    #[error("invalid signature header: {0}")]
    MalformedHeader(String),
    /// Signed timestamp outside the tolerance window.
    #[error("request timestamp too old")]
    StaleTimestamp,
    /// Computed digest does not match any provided signature.
    #[error("signature mismatch")]
    Mismatch,
    /// Event payload failed to parse.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Verifies webhook deliveries against the configured signing secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    /// Create a verifier from the configured webhook secret.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verify a delivery against its signature header.
    ///
    /// `now_unix` is the current unix time in seconds, passed in so tests
    /// can pin it.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] if the header is malformed, the timestamp
    /// is outside the tolerance window, or no `v1` signature matches.
    pub fn verify(&self, header: &str, body: &str, now_unix: i64) -> Result<(), WebhookError> {
        let (timestamp, signatures) = parse_signature_header(header)?;

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| WebhookError::MalformedHeader("invalid timestamp".to_owned()))?;
        if (now_unix - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
            return Err(WebhookError::StaleTimestamp);
        }

        let signed_payload = format!("{timestamp}.{body}");
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| WebhookError::MalformedHeader(e.to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if signatures
            .iter()
            .any(|sig| constant_time_compare(&expected, sig))
        {
            Ok(())
        } else {
            Err(WebhookError::Mismatch)
        }
    }
}

/// Parse a `t=...,v1=...` signature header into its timestamp and the
/// list of `v1` signatures (key rotation can produce several).
fn parse_signature_header(header: &str) -> Result<(&str, Vec<&str>), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            // Unknown schemes (e.g. v0) are ignored per the provider docs.
            Some(_) => {}
            None => {
                return Err(WebhookError::MalformedHeader(
                    "expected key=value pairs".to_owned(),
                ));
            }
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| WebhookError::MalformedHeader("missing timestamp".to_owned()))?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader(
            "missing v1 signature".to_owned(),
        ));
    }

    Ok((timestamp, signatures))
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// =============================================================================
// Event payloads
// =============================================================================

/// A provider event delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingEvent {
    /// Provider event ID.
    pub id: String,
    /// Event type, e.g. `payment_intent.succeeded`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: EventData,
}

/// Event payload wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// The payment intent the event is about.
    pub object: PaymentIntentPayload,
}

/// The payment-intent object embedded in an event.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentPayload {
    /// Remote payment-intent ID.
    pub id: String,
    /// Metadata set at creation (local order ID and order number).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Details of the last failed attempt, on failure events.
    #[serde(default)]
    pub last_payment_error: Option<LastPaymentError>,
}

/// Failure details on `payment_intent.payment_failed`.
#[derive(Debug, Clone, Deserialize)]
pub struct LastPaymentError {
    pub message: Option<String>,
}

impl BillingEvent {
    /// Parse an event from a raw delivery body.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidPayload`] if the body is not a valid
    /// event.
    pub fn from_body(body: &str) -> Result<Self, WebhookError> {
        serde_json::from_str(body).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }
}

/// What the webhook receiver should do with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    /// Mark the order paid and stamp `paid_at`.
    MarkPaid { order_id: OrderId },
    /// Record the payment failure on the order.
    MarkFailed { order_id: OrderId, message: String },
    /// Known event type but no usable order reference in metadata.
    MissingOrderId,
    /// Event type this receiver does not handle.
    Ignore,
}

/// Map an event onto the order mutation it implies.
///
/// Every mutation is a pure overwrite, so reapplying the same event is
/// harmless.
#[must_use]
pub fn classify_event(event: &BillingEvent) -> WebhookAction {
    let order_id = || {
        event
            .data
            .object
            .metadata
            .get(ORDER_ID_KEY)
            .and_then(|raw| raw.parse::<i32>().ok())
            .map(OrderId::new)
    };

    match event.event_type.as_str() {
        "payment_intent.succeeded" => order_id()
            .map_or(WebhookAction::MissingOrderId, |order_id| {
                WebhookAction::MarkPaid { order_id }
            }),
        "payment_intent.payment_failed" => {
            order_id().map_or(WebhookAction::MissingOrderId, |order_id| {
                let message = event
                    .data
                    .object
                    .last_payment_error
                    .as_ref()
                    .and_then(|e| e.message.clone())
                    .unwrap_or_else(|| "Payment failed".to_owned());
                WebhookAction::MarkFailed { order_id, message }
            })
        }
        _ => WebhookAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, body: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
        mac.update(format!("{timestamp}.{body}").as_bytes());
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_valid_signature() {
        let verifier = WebhookVerifier::new(SecretString::from("whsec_test"));
        let body = r#"{"id":"evt_1"}"#;
        let now = 1_700_000_000;
        let header = sign("whsec_test", now, body);

        assert!(verifier.verify(&header, body, now).is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let verifier = WebhookVerifier::new(SecretString::from("whsec_test"));
        let now = 1_700_000_000;
        let header = sign("whsec_test", now, r#"{"id":"evt_1"}"#);

        let result = verifier.verify(&header, r#"{"id":"evt_2"}"#, now);
        assert!(matches!(result, Err(WebhookError::Mismatch)));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let verifier = WebhookVerifier::new(SecretString::from("whsec_other"));
        let body = r#"{"id":"evt_1"}"#;
        let now = 1_700_000_000;
        let header = sign("whsec_test", now, body);

        assert!(matches!(
            verifier.verify(&header, body, now),
            Err(WebhookError::Mismatch)
        ));
    }

    #[test]
    fn test_verify_rejects_stale_timestamp() {
        let verifier = WebhookVerifier::new(SecretString::from("whsec_test"));
        let body = "{}";
        let signed_at = 1_700_000_000;
        let header = sign("whsec_test", signed_at, body);

        let result = verifier.verify(&header, body, signed_at + TIMESTAMP_TOLERANCE_SECS + 1);
        assert!(matches!(result, Err(WebhookError::StaleTimestamp)));
    }

    #[test]
    fn test_verify_rejects_malformed_header() {
        let verifier = WebhookVerifier::new(SecretString::from("whsec_test"));
        assert!(matches!(
            verifier.verify("not-a-header", "{}", 0),
            Err(WebhookError::MalformedHeader(_))
        ));
        assert!(matches!(
            verifier.verify("v1=abc", "{}", 0),
            Err(WebhookError::MalformedHeader(_))
        ));
    }

    fn event(event_type: &str, metadata: &[(&str, &str)], error_message: Option<&str>) -> BillingEvent {
        BillingEvent {
            id: "evt_1".to_owned(),
            event_type: event_type.to_owned(),
            data: EventData {
                object: PaymentIntentPayload {
                    id: "pi_1".to_owned(),
                    metadata: metadata
                        .iter()
                        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                        .collect(),
                    last_payment_error: error_message.map(|m| LastPaymentError {
                        message: Some(m.to_owned()),
                    }),
                },
            },
        }
    }

    #[test]
    fn test_classify_succeeded() {
        let action = classify_event(&event(
            "payment_intent.succeeded",
            &[("orderID", "42"), ("orderNumber", "NX-202506123456-042")],
            None,
        ));
        assert_eq!(
            action,
            WebhookAction::MarkPaid {
                order_id: OrderId::new(42)
            }
        );
    }

    #[test]
    fn test_classify_failed_carries_message() {
        let action = classify_event(&event(
            "payment_intent.payment_failed",
            &[("orderID", "42")],
            Some("Card declined"),
        ));
        assert_eq!(
            action,
            WebhookAction::MarkFailed {
                order_id: OrderId::new(42),
                message: "Card declined".to_owned()
            }
        );
    }

    #[test]
    fn test_classify_failed_without_details() {
        let action = classify_event(&event(
            "payment_intent.payment_failed",
            &[("orderID", "7")],
            None,
        ));
        assert_eq!(
            action,
            WebhookAction::MarkFailed {
                order_id: OrderId::new(7),
                message: "Payment failed".to_owned()
            }
        );
    }

    #[test]
    fn test_classify_missing_order_id() {
        let action = classify_event(&event("payment_intent.succeeded", &[], None));
        assert_eq!(action, WebhookAction::MissingOrderId);
    }

    #[test]
    fn test_classify_unknown_event_type() {
        let action = classify_event(&event("charge.refunded", &[("orderID", "42")], None));
        assert_eq!(action, WebhookAction::Ignore);
    }

    #[test]
    fn test_event_from_body() {
        let body = r#"{
            "id": "evt_9",
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_9", "metadata": {"orderID": "9"}}}
        }"#;
        let event = BillingEvent::from_body(body).expect("valid event");
        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert_eq!(
            classify_event(&event),
            WebhookAction::MarkPaid {
                order_id: OrderId::new(9)
            }
        );
    }
}
