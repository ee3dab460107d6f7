//! Integration tests for Nixe.
//!
//! The tests under `tests/` exercise cross-crate flows without a database
//! or a live billing account: sync hooks against a scripted provider
//! double, webhook deliveries signed the way the provider signs them, and
//! the order money math end to end.
//!
//! ```bash
//! cargo test -p nixe-integration-tests
//! ```
//!
//! This library crate holds the shared test support: the [`ScriptedBilling`]
//! provider double, domain fixtures and a webhook signing helper.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use nixe_api::billing::{
    BillingError, BillingProvider, CustomerFields, PaymentIntentFields, ProductFields,
    RemoteCustomer, RemotePaymentIntent, RemotePrice, RemoteProduct,
};
use nixe_api::models::{Address, AddressSnapshot, Customer, Order, OrderItem, Product};
use nixe_core::{
    AddressKind, CategoryId, CustomerId, Email, Locale, Localized, OrderId, OrderNumber,
    OrderStatus, OrderTotals, ProductId, ProductStatus,
};

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingCall {
    CreateCustomer { email: String },
    UpdateCustomer { remote_id: String },
    CreateProduct { name: String },
    UpdateProduct { remote_id: String },
    CreatePrice { product_id: String, amount_minor: i64 },
    DeactivatePrice { price_id: String },
    CreatePaymentIntent { amount_minor: i64, customer_id: Option<String> },
    UpdatePaymentIntentAmount { intent_id: String, amount_minor: i64 },
}

/// A billing provider double that records every call and returns canned
/// remote IDs. Remote IDs are numbered per object kind so a test can tell
/// the first created price from the second.
#[derive(Default)]
pub struct ScriptedBilling {
    pub calls: Mutex<Vec<BillingCall>>,
    /// When set, `deactivate_price` fails with this message.
    pub fail_deactivate: Option<String>,
    /// When set, `create_payment_intent` fails with this message.
    pub fail_payment_intent: Option<String>,
}

impl ScriptedBilling {
    /// Snapshot of the calls recorded so far.
    pub fn calls(&self) -> Vec<BillingCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: BillingCall) -> usize {
        let mut calls = self.calls.lock().expect("calls lock");
        calls.push(call);
        calls.len()
    }

    fn scripted_failure(message: &Option<String>) -> Result<(), BillingError> {
        match message {
            Some(message) => Err(BillingError::Api {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BillingProvider for ScriptedBilling {
    async fn create_customer(
        &self,
        fields: &CustomerFields,
    ) -> Result<RemoteCustomer, BillingError> {
        let n = self.record(BillingCall::CreateCustomer {
            email: fields.email.clone(),
        });
        Ok(RemoteCustomer {
            id: format!("cus_{n}"),
        })
    }

    async fn update_customer(
        &self,
        remote_id: &str,
        _fields: &CustomerFields,
    ) -> Result<(), BillingError> {
        self.record(BillingCall::UpdateCustomer {
            remote_id: remote_id.to_owned(),
        });
        Ok(())
    }

    async fn create_product(&self, fields: &ProductFields) -> Result<RemoteProduct, BillingError> {
        let n = self.record(BillingCall::CreateProduct {
            name: fields.name.clone(),
        });
        Ok(RemoteProduct {
            id: format!("prod_{n}"),
        })
    }

    async fn update_product(
        &self,
        remote_id: &str,
        _fields: &ProductFields,
    ) -> Result<(), BillingError> {
        self.record(BillingCall::UpdateProduct {
            remote_id: remote_id.to_owned(),
        });
        Ok(())
    }

    async fn create_price(
        &self,
        remote_product_id: &str,
        amount_minor: i64,
    ) -> Result<RemotePrice, BillingError> {
        let n = self.record(BillingCall::CreatePrice {
            product_id: remote_product_id.to_owned(),
            amount_minor,
        });
        Ok(RemotePrice {
            id: format!("price_{n}"),
        })
    }

    async fn deactivate_price(&self, remote_price_id: &str) -> Result<(), BillingError> {
        self.record(BillingCall::DeactivatePrice {
            price_id: remote_price_id.to_owned(),
        });
        Self::scripted_failure(&self.fail_deactivate)
    }

    async fn create_payment_intent(
        &self,
        fields: &PaymentIntentFields,
    ) -> Result<RemotePaymentIntent, BillingError> {
        let n = self.record(BillingCall::CreatePaymentIntent {
            amount_minor: fields.amount_minor,
            customer_id: fields.customer_id.clone(),
        });
        Self::scripted_failure(&self.fail_payment_intent)?;
        Ok(RemotePaymentIntent {
            id: format!("pi_{n}"),
            client_secret: Some(format!("pi_{n}_secret")),
        })
    }

    async fn update_payment_intent_amount(
        &self,
        remote_intent_id: &str,
        amount_minor: i64,
    ) -> Result<(), BillingError> {
        self.record(BillingCall::UpdatePaymentIntentAmount {
            intent_id: remote_intent_id.to_owned(),
            amount_minor,
        });
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A customer fixture with one default shipping address.
pub fn customer_fixture(id: i32, billing_customer_id: Option<&str>) -> Customer {
    Customer {
        id: CustomerId::new(id),
        email: Email::parse("lea@example.com").expect("valid fixture email"),
        name: "Léa Martin".to_owned(),
        phone: Some("+33600000000".to_owned()),
        preferred_language: Locale::Fr,
        addresses: vec![Address {
            kind: AddressKind::Shipping,
            name: "Léa Martin".to_owned(),
            line1: "1 rue de la Plage".to_owned(),
            line2: None,
            city: "Biarritz".to_owned(),
            state: None,
            postal_code: "64200".to_owned(),
            country: "France".to_owned(),
            is_default: true,
        }],
        billing_customer_id: billing_customer_id.map(ToOwned::to_owned),
        order_ids: Vec::new(),
        api_key: Uuid::new_v4(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// An available product fixture.
pub fn product_fixture(id: i32, price: &str) -> Product {
    Product {
        id: ProductId::new(id),
        title: Localized {
            fr: "Planche 7'2".to_owned(),
            en: Some("7'2 surfboard".to_owned()),
        },
        slug: "planche-72".to_owned(),
        price: price.parse().expect("valid fixture price"),
        compare_at_price: None,
        description: Some(Localized::fr_only("Planche polyvalente.".to_owned())),
        category_id: CategoryId::new(1),
        is_occasion: false,
        images: vec!["/images/planche.jpg".to_owned()],
        status: ProductStatus::Available,
        billing_product_id: None,
        billing_price_id: None,
        features: Vec::new(),
        specifications: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// An order fixture whose totals are recomputed from the given items.
pub fn order_fixture(id: i32, customer_id: i32, items: Vec<OrderItem>, shipping_cost: &str) -> Order {
    let shipping_cost: rust_decimal::Decimal = shipping_cost.parse().expect("valid shipping cost");
    let totals = OrderTotals::compute(
        items.iter().map(|item| (item.price, item.quantity)),
        Some(shipping_cost),
    );

    Order {
        id: OrderId::new(id),
        order_number: OrderNumber::generate(),
        customer_id: CustomerId::new(customer_id),
        items,
        status: OrderStatus::Pending,
        shipping_address: address_snapshot(),
        billing_address: address_snapshot(),
        subtotal: totals.subtotal,
        tax: totals.tax,
        shipping_cost,
        total: totals.total,
        billing_payment_intent_id: None,
        client_secret: None,
        payment_error: None,
        paid_at: None,
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A frozen address snapshot fixture.
pub fn address_snapshot() -> AddressSnapshot {
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

// =============================================================================
// Webhook signing
// =============================================================================

/// Sign a webhook body the way the provider does: HMAC-SHA256 over
/// `"{timestamp}.{body}"`, presented as `t=...,v1=...`.
pub fn sign_webhook(secret: &str, timestamp: i64, body: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}.{body}").as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={digest}")
}
