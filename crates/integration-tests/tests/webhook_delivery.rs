//! Webhook deliveries: signature verification and event classification,
//! driven with bodies signed exactly the way the provider signs them.

use secrecy::SecretString;
use serde_json::json;

use nixe_api::billing::{BillingEvent, WebhookAction, WebhookVerifier, classify_event};
use nixe_core::OrderId;
use nixe_integration_tests::sign_webhook;

const SECRET: &str = "whsec_integration";
const NOW: i64 = 1_750_000_000;

fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(SecretString::from(SECRET))
}

fn succeeded_body(order_id: &str) -> String {
    json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "id": "pi_1",
                "metadata": { "orderID": order_id, "orderNumber": "NX-202506123456-042" }
            }
        }
    })
    .to_string()
}

#[test]
fn signed_success_event_maps_to_mark_paid() {
    let body = succeeded_body("42");
    let header = sign_webhook(SECRET, NOW, &body);

    verifier()
        .verify(&header, &body, NOW)
        .expect("valid signature");

    let event = BillingEvent::from_body(&body).expect("valid payload");
    assert_eq!(
        classify_event(&event),
        WebhookAction::MarkPaid {
            order_id: OrderId::new(42)
        }
    );
}

#[test]
fn failure_event_carries_the_provider_message() {
    let body = json!({
        "id": "evt_2",
        "type": "payment_intent.payment_failed",
        "data": {
            "object": {
                "id": "pi_1",
                "metadata": { "orderID": "42" },
                "last_payment_error": { "message": "Your card was declined." }
            }
        }
    })
    .to_string();
    let header = sign_webhook(SECRET, NOW, &body);

    verifier()
        .verify(&header, &body, NOW)
        .expect("valid signature");

    let event = BillingEvent::from_body(&body).expect("valid payload");
    assert_eq!(
        classify_event(&event),
        WebhookAction::MarkFailed {
            order_id: OrderId::new(42),
            message: "Your card was declined.".to_owned()
        }
    );
}

#[test]
fn tampered_body_is_rejected() {
    let body = succeeded_body("42");
    let header = sign_webhook(SECRET, NOW, &body);

    let tampered = body.replace("\"42\"", "\"43\"");
    assert!(verifier().verify(&header, &tampered, NOW).is_err());
}

#[test]
fn wrong_secret_is_rejected() {
    let body = succeeded_body("42");
    let header = sign_webhook("whsec_other", NOW, &body);

    assert!(verifier().verify(&header, &body, NOW).is_err());
}

#[test]
fn stale_delivery_is_rejected() {
    let body = succeeded_body("42");
    let header = sign_webhook(SECRET, NOW - 301, &body);

    assert!(verifier().verify(&header, &body, NOW).is_err());
}

#[test]
fn replayed_delivery_within_tolerance_still_verifies() {
    let body = succeeded_body("42");
    let header = sign_webhook(SECRET, NOW - 299, &body);

    verifier()
        .verify(&header, &body, NOW)
        .expect("within tolerance");
}

#[test]
fn unknown_event_type_is_ignored() {
    let body = json!({
        "id": "evt_3",
        "type": "charge.refunded",
        "data": { "object": { "id": "ch_1" } }
    })
    .to_string();

    let event = BillingEvent::from_body(&body).expect("valid payload");
    assert_eq!(classify_event(&event), WebhookAction::Ignore);
}

#[test]
fn missing_order_reference_is_flagged_not_ignored() {
    let body = json!({
        "id": "evt_4",
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_1", "metadata": {} } }
    })
    .to_string();

    let event = BillingEvent::from_body(&body).expect("valid payload");
    assert_eq!(classify_event(&event), WebhookAction::MissingOrderId);
}
