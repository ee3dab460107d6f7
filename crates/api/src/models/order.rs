//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use nixe_core::{CustomerId, OrderId, OrderNumber, OrderStatus, OrderTotals, ProductId};

/// An order line item.
///
/// Title and price are snapshots taken at purchase time; later catalog
/// changes never affect existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product at time of purchase.
    pub product_id: ProductId,
    /// Title snapshot (in the customer's locale at checkout).
    pub title: String,
    /// Unit price snapshot in euros.
    pub price: Decimal,
    /// Quantity, at least 1.
    pub quantity: i32,
}

/// An address snapshot embedded on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// An order.
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Generated human-readable order number.
    pub order_number: OrderNumber,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Line item snapshots.
    pub items: Vec<OrderItem>,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Shipping address snapshot.
    pub shipping_address: AddressSnapshot,
    /// Billing address snapshot.
    pub billing_address: AddressSnapshot,
    /// Sum of item prices.
    pub subtotal: Decimal,
    /// 20% VAT, rounded to cents.
    pub tax: Decimal,
    /// Shipping cost.
    pub shipping_cost: Decimal,
    /// `subtotal + tax + shipping_cost`.
    pub total: Decimal,
    /// Remote payment-intent ID at the billing provider.
    pub billing_payment_intent_id: Option<String>,
    /// Client secret the storefront uses to confirm the payment.
    pub client_secret: Option<String>,
    /// Message from the last failed payment attempt.
    pub payment_error: Option<String>,
    /// When the payment succeeded.
    pub paid_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Recompute totals from the current items and shipping cost.
    #[must_use]
    pub fn compute_totals(&self) -> OrderTotals {
        compute_item_totals(&self.items, Some(self.shipping_cost))
    }
}

/// Compute order totals from line items.
#[must_use]
pub fn compute_item_totals(items: &[OrderItem], shipping_cost: Option<Decimal>) -> OrderTotals {
    OrderTotals::compute(
        items.iter().map(|item| (item.price, item.quantity)),
        shipping_cost,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    fn item(price: &str, quantity: i32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(1),
            title: "Planche".to_owned(),
            price: dec(price),
            quantity,
        }
    }

    #[test]
    fn test_compute_item_totals() {
        let totals = compute_item_totals(&[item("100", 2), item("50", 1)], Some(dec("10")));
        assert_eq!(totals.subtotal, dec("250"));
        assert_eq!(totals.tax, dec("50.00"));
        assert_eq!(totals.total, dec("310.00"));
    }

    #[test]
    fn test_items_roundtrip_as_json() {
        let items = vec![item("19.99", 3)];
        let json = serde_json::to_string(&items).expect("serialize");
        let back: Vec<OrderItem> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.len(), 1);
        let first = back.first().expect("one item");
        assert_eq!(first.price, dec("19.99"));
        assert_eq!(first.quantity, 3);
    }
}
