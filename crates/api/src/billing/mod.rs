//! Billing provider integration.
//!
//! The provider mirrors local entities into its own object model:
//! customers, products, prices (append-only) and payment intents. The
//! [`BillingProvider`] trait is the seam: a single client is constructed
//! at startup from configuration and injected through `AppState`, so
//! handlers never touch a global client and tests can substitute a double.
//!
//! Sync is push-only (local -> remote); payment outcomes come back through
//! the [`webhook`] receiver.

pub mod stripe;
pub mod webhook;

use async_trait::async_trait;
use thiserror::Error;

use nixe_core::{CustomerId, Locale, MinorUnitsError, OrderId, ProductId};

pub use stripe::StripeClient;
pub use webhook::{BillingEvent, WebhookAction, WebhookVerifier, classify_event};

/// Currency every remote object is denominated in.
pub const CURRENCY: &str = "eur";

/// Errors that can occur when talking to the billing provider.
#[derive(Debug, Error)]
pub enum BillingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// An amount could not be converted to minor units.
    #[error("amount error: {0}")]
    Amount(#[from] MinorUnitsError),

    /// Failed to parse a provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Address fields pushed to the provider's customer object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Customer fields pushed on create and update.
#[derive(Debug, Clone)]
pub struct CustomerFields {
    /// Local ID, carried in remote metadata.
    pub local_id: CustomerId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    /// Default shipping address, when the customer has one.
    pub address: Option<RemoteAddress>,
    pub preferred_language: Locale,
}

/// Product fields pushed on create and update.
#[derive(Debug, Clone)]
pub struct ProductFields {
    /// Local ID, carried in remote metadata.
    pub local_id: ProductId,
    pub name: String,
    pub description: String,
    /// Whether the product is purchasable.
    pub active: bool,
    /// Absolute image URLs.
    pub image_urls: Vec<String>,
}

/// Payment-intent creation request.
#[derive(Debug, Clone)]
pub struct PaymentIntentFields {
    /// Amount in minor units (cents).
    pub amount_minor: i64,
    /// Remote customer to attach, when the local customer has been synced.
    pub customer_id: Option<String>,
    /// Local order ID, carried in remote metadata.
    pub order_id: OrderId,
    /// Human-readable order number, carried in remote metadata.
    pub order_number: String,
}

/// A created remote customer.
#[derive(Debug, Clone)]
pub struct RemoteCustomer {
    pub id: String,
}

/// A created remote product.
#[derive(Debug, Clone)]
pub struct RemoteProduct {
    pub id: String,
}

/// A created remote price.
#[derive(Debug, Clone)]
pub struct RemotePrice {
    pub id: String,
}

/// A created remote payment intent.
#[derive(Debug, Clone)]
pub struct RemotePaymentIntent {
    pub id: String,
    /// Secret the storefront client uses to confirm the payment.
    pub client_secret: Option<String>,
}

/// The billing provider seam.
///
/// One implementation talks to the real provider ([`StripeClient`]); tests
/// use a recording double.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create a remote customer object.
    async fn create_customer(&self, fields: &CustomerFields)
    -> Result<RemoteCustomer, BillingError>;

    /// Push current local fields onto an existing remote customer.
    async fn update_customer(
        &self,
        remote_id: &str,
        fields: &CustomerFields,
    ) -> Result<(), BillingError>;

    /// Create a remote product object.
    async fn create_product(&self, fields: &ProductFields) -> Result<RemoteProduct, BillingError>;

    /// Push current local fields onto an existing remote product.
    async fn update_product(
        &self,
        remote_id: &str,
        fields: &ProductFields,
    ) -> Result<(), BillingError>;

    /// Create a price for a remote product (the provider's price model is
    /// append-only; prices are never amended in place).
    async fn create_price(
        &self,
        remote_product_id: &str,
        amount_minor: i64,
    ) -> Result<RemotePrice, BillingError>;

    /// Deactivate a remote price.
    async fn deactivate_price(&self, remote_price_id: &str) -> Result<(), BillingError>;

    /// Create a payment intent.
    async fn create_payment_intent(
        &self,
        fields: &PaymentIntentFields,
    ) -> Result<RemotePaymentIntent, BillingError>;

    /// Update the amount of an existing payment intent.
    async fn update_payment_intent_amount(
        &self,
        remote_intent_id: &str,
        amount_minor: i64,
    ) -> Result<(), BillingError>;
}
