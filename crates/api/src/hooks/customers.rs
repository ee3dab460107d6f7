//! Customer sync hook.
//!
//! Runs after a customer create or update. First sync creates the remote
//! customer and hands back its ID for the caller to persist; later syncs
//! push the current fields onto the existing remote object and never
//! create a second one.

use tracing::debug;

use nixe_core::AddressKind;

use crate::billing::{BillingError, BillingProvider, CustomerFields, RemoteAddress};
use crate::models::Customer;

/// What the customer sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerSyncOutcome {
    /// Remote customer created; the caller persists the returned ID.
    Created { billing_customer_id: String },
    /// Existing remote customer updated in place.
    Updated,
}

/// Build the provider payload from a customer.
fn customer_fields(customer: &Customer) -> CustomerFields {
    let address = customer
        .default_address(AddressKind::Shipping)
        .map(|a| RemoteAddress {
            line1: a.line1.clone(),
            line2: a.line2.clone(),
            city: a.city.clone(),
            postal_code: a.postal_code.clone(),
            country: a.country.clone(),
        });

    CustomerFields {
        local_id: customer.id,
        email: customer.email.as_str().to_owned(),
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        address,
        preferred_language: customer.preferred_language,
    }
}

/// Mirror a customer to the billing provider.
///
/// # Errors
///
/// Returns [`BillingError`] if the provider call fails. The caller logs
/// and swallows it; the local write is never reverted.
pub async fn sync_customer(
    provider: &dyn BillingProvider,
    customer: &Customer,
) -> Result<CustomerSyncOutcome, BillingError> {
    let fields = customer_fields(customer);

    match &customer.billing_customer_id {
        Some(remote_id) => {
            provider.update_customer(remote_id, &fields).await?;
            debug!(customer_id = %customer.id, %remote_id, "updated billing customer");
            Ok(CustomerSyncOutcome::Updated)
        }
        None => {
            let remote = provider.create_customer(&fields).await?;
            debug!(customer_id = %customer.id, remote_id = %remote.id, "created billing customer");
            Ok(CustomerSyncOutcome::Created {
                billing_customer_id: remote.id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use nixe_core::{CustomerId, Email, Locale};

    use super::*;
    use crate::hooks::test_support::{Call, RecordingProvider};
    use crate::models::Address;

    fn customer(billing_customer_id: Option<&str>) -> Customer {
        Customer {
            id: CustomerId::new(7),
            email: Email::parse("lea@example.com").expect("valid"),
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

    #[tokio::test]
    async fn test_first_sync_creates_remote_customer() {
        let provider = RecordingProvider::default();

        let outcome = sync_customer(&provider, &customer(None))
            .await
            .expect("sync succeeds");

        assert_eq!(
            outcome,
            CustomerSyncOutcome::Created {
                billing_customer_id: "cus_test".to_owned()
            }
        );
        assert_eq!(provider.calls(), vec![Call::CreateCustomer]);
    }

    #[tokio::test]
    async fn test_second_sync_updates_never_recreates() {
        let provider = RecordingProvider::default();

        let outcome = sync_customer(&provider, &customer(Some("cus_existing")))
            .await
            .expect("sync succeeds");

        assert_eq!(outcome, CustomerSyncOutcome::Updated);
        assert_eq!(
            provider.calls(),
            vec![Call::UpdateCustomer {
                remote_id: "cus_existing".to_owned()
            }]
        );
    }

    #[test]
    fn test_fields_use_default_shipping_address() {
        let fields = customer_fields(&customer(None));
        let address = fields.address.expect("has address");
        assert_eq!(address.city, "Biarritz");
        assert_eq!(fields.preferred_language, Locale::Fr);
    }
}
