//! Stripe-compatible billing provider client.
//!
//! Speaks the provider's form-encoded REST wire format. All calls are
//! single round-trips with the SDK-default transport timeout as the only
//! bound; retries and reconciliation live in the order-pipeline saga, not
//! here.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::BillingConfig;

use super::{
    BillingError, BillingProvider, CURRENCY, CustomerFields, PaymentIntentFields, ProductFields,
    RemoteCustomer, RemotePaymentIntent, RemotePrice, RemoteProduct,
};

/// Stripe-compatible REST client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
}

/// Generic created-object response (`{"id": "..."}`).
#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: String,
}

/// Payment-intent response.
#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
    client_secret: Option<String>,
}

/// Provider error envelope (`{"error": {"message": "..."}}`).
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeClient {
    /// Create a new client from the billing configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &BillingConfig) -> Result<Self, BillingError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| BillingError::Parse(format!("Invalid API key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        })
    }

    /// POST a form-encoded request and decode the JSON response.
    async fn post_form<T>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, BillingError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{path}", self.api_base);
        let response = self.client.post(&url).form(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(BillingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| BillingError::Parse(e.to_string()))
    }
}

/// Build the form params shared by customer create and update.
fn customer_params(fields: &CustomerFields) -> Vec<(String, String)> {
    let mut params = vec![
        ("email".to_owned(), fields.email.clone()),
        ("name".to_owned(), fields.name.clone()),
        (
            "metadata[customerID]".to_owned(),
            fields.local_id.to_string(),
        ),
        (
            "metadata[preferredLanguage]".to_owned(),
            fields.preferred_language.to_string(),
        ),
    ];
    if let Some(phone) = &fields.phone {
        params.push(("phone".to_owned(), phone.clone()));
    }
    if let Some(address) = &fields.address {
        params.push(("address[line1]".to_owned(), address.line1.clone()));
        if let Some(line2) = &address.line2 {
            params.push(("address[line2]".to_owned(), line2.clone()));
        }
        params.push(("address[city]".to_owned(), address.city.clone()));
        params.push((
            "address[postal_code]".to_owned(),
            address.postal_code.clone(),
        ));
        params.push(("address[country]".to_owned(), address.country.clone()));
    }
    params
}

/// Build the form params shared by product create and update.
fn product_params(fields: &ProductFields) -> Vec<(String, String)> {
    let mut params = vec![
        ("name".to_owned(), fields.name.clone()),
        ("description".to_owned(), fields.description.clone()),
        ("active".to_owned(), fields.active.to_string()),
        ("metadata[productID]".to_owned(), fields.local_id.to_string()),
    ];
    for (i, url) in fields.image_urls.iter().enumerate() {
        params.push((format!("images[{i}]"), url.clone()));
    }
    params
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(
        &self,
        fields: &CustomerFields,
    ) -> Result<RemoteCustomer, BillingError> {
        let created: CreatedObject = self
            .post_form("/v1/customers", &customer_params(fields))
            .await?;
        Ok(RemoteCustomer { id: created.id })
    }

    async fn update_customer(
        &self,
        remote_id: &str,
        fields: &CustomerFields,
    ) -> Result<(), BillingError> {
        let _: CreatedObject = self
            .post_form(&format!("/v1/customers/{remote_id}"), &customer_params(fields))
            .await?;
        Ok(())
    }

    async fn create_product(&self, fields: &ProductFields) -> Result<RemoteProduct, BillingError> {
        let created: CreatedObject = self
            .post_form("/v1/products", &product_params(fields))
            .await?;
        Ok(RemoteProduct { id: created.id })
    }

    async fn update_product(
        &self,
        remote_id: &str,
        fields: &ProductFields,
    ) -> Result<(), BillingError> {
        let _: CreatedObject = self
            .post_form(&format!("/v1/products/{remote_id}"), &product_params(fields))
            .await?;
        Ok(())
    }

    async fn create_price(
        &self,
        remote_product_id: &str,
        amount_minor: i64,
    ) -> Result<RemotePrice, BillingError> {
        let params = vec![
            ("product".to_owned(), remote_product_id.to_owned()),
            ("unit_amount".to_owned(), amount_minor.to_string()),
            ("currency".to_owned(), CURRENCY.to_owned()),
        ];
        let created: CreatedObject = self.post_form("/v1/prices", &params).await?;
        Ok(RemotePrice { id: created.id })
    }

    async fn deactivate_price(&self, remote_price_id: &str) -> Result<(), BillingError> {
        let params = vec![("active".to_owned(), "false".to_owned())];
        let _: CreatedObject = self
            .post_form(&format!("/v1/prices/{remote_price_id}"), &params)
            .await?;
        Ok(())
    }

    async fn create_payment_intent(
        &self,
        fields: &PaymentIntentFields,
    ) -> Result<RemotePaymentIntent, BillingError> {
        let mut params = vec![
            ("amount".to_owned(), fields.amount_minor.to_string()),
            ("currency".to_owned(), CURRENCY.to_owned()),
            ("metadata[orderID]".to_owned(), fields.order_id.to_string()),
            ("metadata[orderNumber]".to_owned(), fields.order_number.clone()),
            (
                "automatic_payment_methods[enabled]".to_owned(),
                "true".to_owned(),
            ),
        ];
        if let Some(customer_id) = &fields.customer_id {
            params.push(("customer".to_owned(), customer_id.clone()));
        }

        let intent: PaymentIntentObject = self.post_form("/v1/payment_intents", &params).await?;
        Ok(RemotePaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }

    async fn update_payment_intent_amount(
        &self,
        remote_intent_id: &str,
        amount_minor: i64,
    ) -> Result<(), BillingError> {
        let params = vec![("amount".to_owned(), amount_minor.to_string())];
        let _: CreatedObject = self
            .post_form(&format!("/v1/payment_intents/{remote_intent_id}"), &params)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nixe_core::{CustomerId, Locale, OrderId, ProductId};

    #[test]
    fn test_customer_params_include_metadata() {
        let fields = CustomerFields {
            local_id: CustomerId::new(7),
            email: "lea@example.com".to_owned(),
            name: "Léa".to_owned(),
            phone: None,
            address: None,
            preferred_language: Locale::Fr,
        };

        let params = customer_params(&fields);
        assert!(params.contains(&("metadata[customerID]".to_owned(), "7".to_owned())));
        assert!(params.contains(&("metadata[preferredLanguage]".to_owned(), "fr".to_owned())));
        assert!(!params.iter().any(|(k, _)| k.starts_with("address")));
    }

    #[test]
    fn test_product_params_index_images() {
        let fields = ProductFields {
            local_id: ProductId::new(3),
            name: "Planche".to_owned(),
            description: String::new(),
            active: true,
            image_urls: vec!["https://a/1.jpg".to_owned(), "https://a/2.jpg".to_owned()],
        };

        let params = product_params(&fields);
        assert!(params.contains(&("images[0]".to_owned(), "https://a/1.jpg".to_owned())));
        assert!(params.contains(&("images[1]".to_owned(), "https://a/2.jpg".to_owned())));
        assert!(params.contains(&("active".to_owned(), "true".to_owned())));
    }

    #[test]
    fn test_payment_intent_fields_carry_order_metadata() {
        let fields = PaymentIntentFields {
            amount_minor: 31000,
            customer_id: Some("cus_123".to_owned()),
            order_id: OrderId::new(42),
            order_number: "NX-202506123456-042".to_owned(),
        };

        assert_eq!(fields.amount_minor, 31000);
        assert_eq!(fields.order_id.to_string(), "42");
    }
}
