//! Customer domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nixe_core::{AddressKind, CustomerId, Email, Locale, OrderId};

/// A saved customer address.
///
/// Stored as a JSONB array on the customer row. Default flags are
/// independent per kind: one default shipping and one default billing
/// address can coexist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Shipping or billing.
    pub kind: AddressKind,
    /// Recipient name.
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    /// Defaults to "France".
    pub country: String,
    /// Whether this is the default address for its kind.
    #[serde(default)]
    pub is_default: bool,
}

/// A customer account.
#[derive(Debug, Clone)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Auth identity.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Preferred storefront language.
    pub preferred_language: Locale,
    /// Saved addresses.
    pub addresses: Vec<Address>,
    /// Remote customer ID at the billing provider, populated after the
    /// first sync.
    pub billing_customer_id: Option<String>,
    /// Back-reference to orders, maintained imperatively by the
    /// post-create order hook. Can drift if the update step fails; the
    /// reconciler retries it.
    pub order_ids: Vec<OrderId>,
    /// Per-customer API key for header authentication.
    pub api_key: Uuid,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// The default address of a given kind, if any.
    #[must_use]
    pub fn default_address(&self, kind: AddressKind) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|a| a.kind == kind && a.is_default)
            .or_else(|| self.addresses.iter().find(|a| a.kind == kind))
    }
}

/// Append an order ID to a back-reference list if not already present.
///
/// Returns `true` if the list changed. Running the hook twice for the same
/// order must not produce a duplicate entry.
pub fn append_order_once(order_ids: &mut Vec<OrderId>, order_id: OrderId) -> bool {
    if order_ids.contains(&order_id) {
        return false;
    }
    order_ids.push(order_id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_order_once_is_idempotent() {
        let mut order_ids = vec![OrderId::new(1)];

        assert!(append_order_once(&mut order_ids, OrderId::new(2)));
        assert!(!append_order_once(&mut order_ids, OrderId::new(2)));
        assert_eq!(order_ids, vec![OrderId::new(1), OrderId::new(2)]);
    }

    #[test]
    fn test_default_address_prefers_flagged() {
        let shipping = |is_default| Address {
            kind: AddressKind::Shipping,
            name: "Léa".to_owned(),
            line1: "1 rue de la Plage".to_owned(),
            line2: None,
            city: "Biarritz".to_owned(),
            state: None,
            postal_code: "64200".to_owned(),
            country: "France".to_owned(),
            is_default,
        };

        let customer = Customer {
            id: CustomerId::new(1),
            email: Email::parse("lea@example.com").expect("valid"),
            name: "Léa".to_owned(),
            phone: None,
            preferred_language: Locale::Fr,
            addresses: vec![shipping(false), shipping(true)],
            billing_customer_id: None,
            order_ids: Vec::new(),
            api_key: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let default = customer
            .default_address(AddressKind::Shipping)
            .expect("has shipping address");
        assert!(default.is_default);
        assert!(customer.default_address(AddressKind::Billing).is_none());
    }
}
