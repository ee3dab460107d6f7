//! Billing provider webhook receiver.
//!
//! Signature verification is the gate: without a configured secret or a
//! valid signature the delivery is rejected with 400. Past the gate, the
//! response is always `200 {"received": true}` no matter what processing
//! does, so the provider never retries a delivery we already saw.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::billing::{BillingEvent, WebhookAction, classify_event};
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Signature header name (Stripe wire format).
const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Handle a billing provider event delivery.
pub async fn billing(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>> {
    let verifier = state
        .webhook_verifier()
        .ok_or_else(|| AppError::BadRequest("Webhook secret not configured".to_owned()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature header".to_owned()))?;

    verifier
        .verify(signature, &body, Utc::now().timestamp())
        .map_err(|e| AppError::BadRequest(format!("Invalid signature: {e}")))?;

    let event = BillingEvent::from_body(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid event payload: {e}")))?;

    // Verified deliveries always get a 200; processing failures are
    // logged, not surfaced, so the provider does not redeliver.
    apply_event(&state, &event).await;

    Ok(Json(json!({"received": true})))
}

/// Reflect an event onto the order it references.
async fn apply_event(state: &AppState, event: &BillingEvent) {
    let orders = OrderRepository::new(state.pool());

    match classify_event(event) {
        WebhookAction::MarkPaid { order_id } => {
            match orders.mark_paid(order_id, Utc::now()).await {
                Ok(()) => debug!(event_id = %event.id, %order_id, "order marked paid"),
                Err(e) => {
                    error!(event_id = %event.id, %order_id, error = %e, "failed to mark order paid");
                }
            }
        }
        WebhookAction::MarkFailed { order_id, message } => {
            match orders.mark_payment_failed(order_id, &message).await {
                Ok(()) => debug!(event_id = %event.id, %order_id, "order payment failure recorded"),
                Err(e) => {
                    error!(event_id = %event.id, %order_id, error = %e, "failed to record payment failure");
                }
            }
        }
        WebhookAction::MissingOrderId => {
            warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                "event carries no usable order reference, ignoring"
            );
        }
        WebhookAction::Ignore => {
            debug!(
                event_id = %event.id,
                event_type = %event.event_type,
                "unhandled event type, ignoring"
            );
        }
    }
}
