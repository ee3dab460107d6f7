//! Billing sync flows across customer and product hooks.
//!
//! These run the real hooks against the scripted provider double and feed
//! each outcome back into the model the way the route handlers persist it,
//! so the assertions cover the whole create/update/rotate lifecycle.

use url::Url;

use nixe_api::hooks::{CustomerSyncOutcome, sync_customer, sync_product};
use nixe_integration_tests::{BillingCall, ScriptedBilling, customer_fixture, product_fixture};

fn public_base() -> Url {
    Url::parse("https://shop.nixesurf.fr").expect("valid url")
}

#[tokio::test]
async fn customer_lifecycle_creates_once_then_updates() {
    let provider = ScriptedBilling::default();
    let mut customer = customer_fixture(7, None);

    // First sync: remote customer created, ID persisted locally.
    let outcome = sync_customer(&provider, &customer).await.expect("first sync");
    let CustomerSyncOutcome::Created { billing_customer_id } = outcome else {
        panic!("first sync must create");
    };
    customer.billing_customer_id = Some(billing_customer_id.clone());

    // Two more syncs: updates against the same remote object, never a
    // second create.
    sync_customer(&provider, &customer).await.expect("second sync");
    customer.phone = None;
    sync_customer(&provider, &customer).await.expect("third sync");

    assert_eq!(
        provider.calls(),
        vec![
            BillingCall::CreateCustomer {
                email: "lea@example.com".to_owned()
            },
            BillingCall::UpdateCustomer {
                remote_id: billing_customer_id.clone()
            },
            BillingCall::UpdateCustomer {
                remote_id: billing_customer_id
            },
        ]
    );
}

#[tokio::test]
async fn product_lifecycle_rotates_prices_forward() {
    let provider = ScriptedBilling::default();
    let mut product = product_fixture(3, "450");

    // First sync: product and price created together.
    let outcome = sync_product(&provider, &product, None, &public_base())
        .await
        .expect("first sync");
    product.billing_product_id = Some(outcome.billing_product_id.clone());
    product.billing_price_id = outcome.billing_price_id.clone();
    let first_price_id = outcome.billing_price_id.expect("first sync creates a price");

    // Price change: the old remote price is deactivated and a fresh one
    // created; the stored ID moves to the new price.
    let previous_price = Some(product.price);
    product.price = "500".parse().expect("decimal");
    let outcome = sync_product(&provider, &product, previous_price, &public_base())
        .await
        .expect("second sync");
    let second_price_id = outcome.billing_price_id.expect("price change creates a price");
    assert_ne!(first_price_id, second_price_id);
    product.billing_price_id = Some(second_price_id);

    // Unchanged price: remote product refreshed, price left alone.
    let previous_price = Some(product.price);
    let outcome = sync_product(&provider, &product, previous_price, &public_base())
        .await
        .expect("third sync");
    assert_eq!(outcome.billing_price_id, None);

    let calls = provider.calls();
    assert_eq!(
        calls,
        vec![
            BillingCall::CreateProduct {
                name: "Planche 7'2".to_owned()
            },
            BillingCall::CreatePrice {
                product_id: "prod_1".to_owned(),
                amount_minor: 45000
            },
            BillingCall::UpdateProduct {
                remote_id: "prod_1".to_owned()
            },
            BillingCall::DeactivatePrice {
                price_id: first_price_id
            },
            BillingCall::CreatePrice {
                product_id: "prod_1".to_owned(),
                amount_minor: 50000
            },
            BillingCall::UpdateProduct {
                remote_id: "prod_1".to_owned()
            },
        ]
    );
}

#[tokio::test]
async fn failed_deactivation_does_not_block_the_new_price() {
    let provider = ScriptedBilling {
        fail_deactivate: Some("no such price".to_owned()),
        ..ScriptedBilling::default()
    };
    let mut product = product_fixture(3, "450");
    product.billing_product_id = Some("prod_1".to_owned());
    product.billing_price_id = Some("price_1".to_owned());

    let previous_price = Some("450".parse().expect("decimal"));
    product.price = "500".parse().expect("decimal");

    let outcome = sync_product(&provider, &product, previous_price, &public_base())
        .await
        .expect("sync succeeds despite deactivation failure");

    assert!(outcome.billing_price_id.is_some());
    assert!(
        provider
            .calls()
            .iter()
            .any(|call| matches!(call, BillingCall::CreatePrice { .. }))
    );
}
