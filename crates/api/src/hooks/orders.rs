//! Order payment-intent hooks.
//!
//! These run as recorded saga steps (see [`crate::sync`]), so a failure
//! here is retried by the reconciler instead of being swallowed.

use tracing::debug;

use nixe_core::to_minor_units;

use crate::billing::{BillingError, BillingProvider, PaymentIntentFields};
use crate::models::{Customer, Order};

/// A created payment intent; the caller persists both fields on the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentOutcome {
    pub intent_id: String,
    pub client_secret: Option<String>,
}

/// Create a payment intent for an order total.
///
/// Returns `None` when the order already carries an intent, which makes
/// the creation path idempotent under retries. The customer's remote ID is
/// attached when present; a missing one does not trigger a customer sync.
///
/// # Errors
///
/// Returns [`BillingError`] if the amount conversion or the provider call
/// fails.
pub async fn create_payment_intent(
    provider: &dyn BillingProvider,
    order: &Order,
    customer: &Customer,
) -> Result<Option<PaymentIntentOutcome>, BillingError> {
    if order.billing_payment_intent_id.is_some() {
        debug!(order_id = %order.id, "payment intent already exists, skipping");
        return Ok(None);
    }

    let fields = PaymentIntentFields {
        amount_minor: to_minor_units(order.total)?,
        customer_id: customer.billing_customer_id.clone(),
        order_id: order.id,
        order_number: order.order_number.as_str().to_owned(),
    };

    let intent = provider.create_payment_intent(&fields).await?;
    debug!(order_id = %order.id, intent_id = %intent.id, "created payment intent");

    Ok(Some(PaymentIntentOutcome {
        intent_id: intent.id,
        client_secret: intent.client_secret,
    }))
}

/// Push the current total onto an existing payment intent.
///
/// Returns `false` when the order has no intent to update.
///
/// # Errors
///
/// Returns [`BillingError`] if the amount conversion or the provider call
/// fails.
pub async fn push_payment_intent_amount(
    provider: &dyn BillingProvider,
    order: &Order,
) -> Result<bool, BillingError> {
    let Some(intent_id) = &order.billing_payment_intent_id else {
        debug!(order_id = %order.id, "no payment intent to update, skipping");
        return Ok(false);
    };

    let amount_minor = to_minor_units(order.total)?;
    provider
        .update_payment_intent_amount(intent_id, amount_minor)
        .await?;
    debug!(order_id = %order.id, %intent_id, amount_minor, "updated payment intent amount");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use nixe_core::{CustomerId, Email, Locale, OrderId, OrderNumber, OrderStatus, ProductId};

    use super::*;
    use crate::hooks::test_support::{Call, RecordingProvider};
    use crate::models::{AddressSnapshot, OrderItem};

    fn snapshot() -> AddressSnapshot {
        AddressSnapshot {
            name: "Léa Martin".to_owned(),
            line1: "1 rue de la Plage".to_owned(),
            line2: None,
            city: "Biarritz".to_owned(),
            state: None,
            postal_code: "64200".to_owned(),
            country: "France".to_owned(),
        }
    }

    fn order(intent_id: Option<&str>) -> Order {
        Order {
            id: OrderId::new(42),
            order_number: OrderNumber::generate(),
            customer_id: CustomerId::new(7),
            items: vec![OrderItem {
                product_id: ProductId::new(3),
                title: "Planche 7'2".to_owned(),
                price: "250".parse().expect("decimal"),
                quantity: 1,
            }],
            status: OrderStatus::Pending,
            shipping_address: snapshot(),
            billing_address: snapshot(),
            subtotal: "250".parse().expect("decimal"),
            tax: "50.00".parse().expect("decimal"),
            shipping_cost: "10".parse().expect("decimal"),
            total: "310.00".parse().expect("decimal"),
            billing_payment_intent_id: intent_id.map(ToOwned::to_owned),
            client_secret: None,
            payment_error: None,
            paid_at: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn customer(billing_customer_id: Option<&str>) -> Customer {
        Customer {
            id: CustomerId::new(7),
            email: Email::parse("lea@example.com").expect("valid"),
            name: "Léa Martin".to_owned(),
            phone: None,
            preferred_language: Locale::Fr,
            addresses: Vec::new(),
            billing_customer_id: billing_customer_id.map(ToOwned::to_owned),
            order_ids: Vec::new(),
            api_key: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_creates_intent_in_minor_units() {
        let provider = RecordingProvider::default();

        let outcome = create_payment_intent(&provider, &order(None), &customer(Some("cus_9")))
            .await
            .expect("hook succeeds")
            .expect("intent created");

        assert_eq!(outcome.intent_id, "pi_test");
        assert_eq!(outcome.client_secret.as_deref(), Some("pi_test_secret"));
        assert_eq!(
            provider.calls(),
            vec![Call::CreatePaymentIntent {
                amount_minor: 31000,
                customer_id: Some("cus_9".to_owned())
            }]
        );
    }

    #[tokio::test]
    async fn test_existing_intent_is_not_recreated() {
        let provider = RecordingProvider::default();

        let outcome = create_payment_intent(&provider, &order(Some("pi_old")), &customer(None))
            .await
            .expect("hook succeeds");

        assert_eq!(outcome, None);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsynced_customer_omits_customer_param() {
        let provider = RecordingProvider::default();

        create_payment_intent(&provider, &order(None), &customer(None))
            .await
            .expect("hook succeeds");

        assert_eq!(
            provider.calls(),
            vec![Call::CreatePaymentIntent {
                amount_minor: 31000,
                customer_id: None
            }]
        );
    }

    #[tokio::test]
    async fn test_amount_update_targets_existing_intent() {
        let provider = RecordingProvider::default();

        let pushed = push_payment_intent_amount(&provider, &order(Some("pi_old")))
            .await
            .expect("hook succeeds");

        assert!(pushed);
        assert_eq!(
            provider.calls(),
            vec![Call::UpdatePaymentIntentAmount {
                intent_id: "pi_old".to_owned(),
                amount_minor: 31000
            }]
        );
    }

    #[tokio::test]
    async fn test_amount_update_without_intent_is_a_noop() {
        let provider = RecordingProvider::default();

        let pushed = push_payment_intent_amount(&provider, &order(None))
            .await
            .expect("hook succeeds");

        assert!(!pushed);
        assert!(provider.calls().is_empty());
    }
}
