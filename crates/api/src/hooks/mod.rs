//! Post-write sync hooks.
//!
//! Each hook runs after a local write has committed and pushes the change
//! to the billing provider. Hooks never revert local writes: they return a
//! typed outcome that the caller persists, and the caller decides whether
//! a failure is swallowed (customer/product sync) or recorded as a saga
//! step and retried (order pipeline, see [`crate::sync`]).

pub mod customers;
pub mod orders;
pub mod products;

pub use customers::{CustomerSyncOutcome, sync_customer};
pub use orders::{PaymentIntentOutcome, create_payment_intent, push_payment_intent_amount};
pub use products::{ProductSyncOutcome, sync_product};

#[cfg(test)]
pub(crate) mod test_support {
    //! Recording double for the billing provider.

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::billing::{
        BillingError, BillingProvider, CustomerFields, PaymentIntentFields, ProductFields,
        RemoteCustomer, RemotePaymentIntent, RemotePrice, RemoteProduct,
    };

    /// One recorded provider call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        CreateCustomer,
        UpdateCustomer { remote_id: String },
        CreateProduct,
        UpdateProduct { remote_id: String },
        CreatePrice { product_id: String, amount_minor: i64 },
        DeactivatePrice { price_id: String },
        CreatePaymentIntent { amount_minor: i64, customer_id: Option<String> },
        UpdatePaymentIntentAmount { intent_id: String, amount_minor: i64 },
    }

    /// Records every call and hands out canned remote IDs.
    #[derive(Default)]
    pub struct RecordingProvider {
        pub calls: Mutex<Vec<Call>>,
        /// When set, `deactivate_price` fails with this message.
        pub fail_deactivate: Option<String>,
    }

    impl RecordingProvider {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().expect("calls lock").clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().expect("calls lock").push(call);
        }
    }

    #[async_trait]
    impl BillingProvider for RecordingProvider {
        async fn create_customer(
            &self,
            _fields: &CustomerFields,
        ) -> Result<RemoteCustomer, BillingError> {
            self.record(Call::CreateCustomer);
            Ok(RemoteCustomer {
                id: "cus_test".to_owned(),
            })
        }

        async fn update_customer(
            &self,
            remote_id: &str,
            _fields: &CustomerFields,
        ) -> Result<(), BillingError> {
            self.record(Call::UpdateCustomer {
                remote_id: remote_id.to_owned(),
            });
            Ok(())
        }

        async fn create_product(
            &self,
            _fields: &ProductFields,
        ) -> Result<RemoteProduct, BillingError> {
            self.record(Call::CreateProduct);
            Ok(RemoteProduct {
                id: "prod_test".to_owned(),
            })
        }

        async fn update_product(
            &self,
            remote_id: &str,
            _fields: &ProductFields,
        ) -> Result<(), BillingError> {
            self.record(Call::UpdateProduct {
                remote_id: remote_id.to_owned(),
            });
            Ok(())
        }

        async fn create_price(
            &self,
            remote_product_id: &str,
            amount_minor: i64,
        ) -> Result<RemotePrice, BillingError> {
            self.record(Call::CreatePrice {
                product_id: remote_product_id.to_owned(),
                amount_minor,
            });
            Ok(RemotePrice {
                id: "price_test".to_owned(),
            })
        }

        async fn deactivate_price(&self, remote_price_id: &str) -> Result<(), BillingError> {
            self.record(Call::DeactivatePrice {
                price_id: remote_price_id.to_owned(),
            });
            match &self.fail_deactivate {
                Some(message) => Err(BillingError::Api {
                    status: 404,
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }

        async fn create_payment_intent(
            &self,
            fields: &PaymentIntentFields,
        ) -> Result<RemotePaymentIntent, BillingError> {
            self.record(Call::CreatePaymentIntent {
                amount_minor: fields.amount_minor,
                customer_id: fields.customer_id.clone(),
            });
            Ok(RemotePaymentIntent {
                id: "pi_test".to_owned(),
                client_secret: Some("pi_test_secret".to_owned()),
            })
        }

        async fn update_payment_intent_amount(
            &self,
            remote_intent_id: &str,
            amount_minor: i64,
        ) -> Result<(), BillingError> {
            self.record(Call::UpdatePaymentIntentAmount {
                intent_id: remote_intent_id.to_owned(),
                amount_minor,
            });
            Ok(())
        }
    }
}
