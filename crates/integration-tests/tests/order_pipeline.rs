//! Order pipeline: totals, order numbers, payment-intent hooks and the
//! customer back-reference, chained the way checkout runs them.

use rust_decimal::Decimal;

use nixe_api::hooks::{create_payment_intent, push_payment_intent_amount};
use nixe_api::models::{OrderItem, append_order_once};
use nixe_core::{OrderNumber, OrderStatus, OrderTotals, ProductId, to_minor_units};
use nixe_integration_tests::{BillingCall, ScriptedBilling, customer_fixture, order_fixture};

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

fn items() -> Vec<OrderItem> {
    vec![
        OrderItem {
            product_id: ProductId::new(1),
            title: "Planche 7'2".to_owned(),
            price: dec("100"),
            quantity: 2,
        },
        OrderItem {
            product_id: ProductId::new(2),
            title: "Leash 8 pieds".to_owned(),
            price: dec("50"),
            quantity: 1,
        },
    ]
}

#[test]
fn checkout_totals_carry_twenty_percent_vat() {
    let order = order_fixture(42, 7, items(), "10");

    assert_eq!(order.subtotal, dec("250"));
    assert_eq!(order.tax, dec("50.00"));
    assert_eq!(order.total, dec("310.00"));
    assert_eq!(to_minor_units(order.total).expect("cents"), 31000);
}

#[test]
fn order_numbers_are_well_formed_and_dated() {
    let order = order_fixture(42, 7, items(), "10");

    let parsed =
        OrderNumber::parse(order.order_number.as_str()).expect("generated numbers are valid");
    let (_, month) = parsed.year_month().expect("has year and month");
    assert!((1..=12).contains(&month));
}

#[tokio::test]
async fn checkout_creates_one_intent_then_pushes_amount_changes() {
    let provider = ScriptedBilling::default();
    let customer = customer_fixture(7, Some("cus_9"));
    let mut order = order_fixture(42, 7, items(), "10");

    // Payment-intent step: created once, idempotent on retry.
    let outcome = create_payment_intent(&provider, &order, &customer)
        .await
        .expect("hook succeeds")
        .expect("intent created");
    order.billing_payment_intent_id = Some(outcome.intent_id.clone());
    order.client_secret = outcome.client_secret;

    let retried = create_payment_intent(&provider, &order, &customer)
        .await
        .expect("retry succeeds");
    assert_eq!(retried, None);

    // The customer edits the order; the new total is pushed onto the
    // existing intent.
    let totals = OrderTotals::compute(
        order.items.iter().map(|item| (item.price, item.quantity)),
        Some(dec("25")),
    );
    order.shipping_cost = dec("25");
    order.total = totals.total;

    let pushed = push_payment_intent_amount(&provider, &order)
        .await
        .expect("push succeeds");
    assert!(pushed);

    assert_eq!(
        provider.calls(),
        vec![
            BillingCall::CreatePaymentIntent {
                amount_minor: 31000,
                customer_id: Some("cus_9".to_owned())
            },
            BillingCall::UpdatePaymentIntentAmount {
                intent_id: outcome.intent_id,
                amount_minor: 32500
            },
        ]
    );
}

#[test]
fn back_reference_survives_a_replayed_hook() {
    let mut customer = customer_fixture(7, None);
    let order = order_fixture(42, 7, items(), "10");

    assert!(append_order_once(&mut customer.order_ids, order.id));
    assert!(!append_order_once(&mut customer.order_ids, order.id));
    assert_eq!(customer.order_ids, vec![order.id]);
}

#[test]
fn order_walks_the_payment_lifecycle() {
    let order = order_fixture(42, 7, items(), "10");
    assert_eq!(order.status, OrderStatus::Pending);

    // Intent creation moves the order to awaiting_payment; the webhook
    // then settles it one way or the other.
    assert!(order.status.can_transition_to(OrderStatus::AwaitingPayment));
    assert!(OrderStatus::AwaitingPayment.can_transition_to(OrderStatus::Paid));
    assert!(OrderStatus::AwaitingPayment.can_transition_to(OrderStatus::Failed));
    assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Fulfilled));

    // Settled orders cannot be reopened.
    assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
    assert!(OrderStatus::Fulfilled.is_terminal());
}
