//! Status enums for orders, products and addresses.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing a status from its database representation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind} status: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

/// Order lifecycle status.
///
/// A single vocabulary covering both the admin-driven lifecycle and the
/// payment outcomes reflected by the billing webhook:
///
/// ```text
/// pending -> awaiting_payment -> paid -> fulfilled
///    |               |            \
///    +-> cancelled   +-> cancelled +-> (terminal after fulfilled)
///    +-> failed      +-> failed
/// ```
///
/// `awaiting_payment` is entered when the payment intent is created;
/// the webhook moves orders to `paid` or `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order persisted, no payment intent yet.
    #[default]
    Pending,
    /// Payment intent created, waiting for the customer to pay.
    AwaitingPayment,
    /// Payment confirmed by the billing provider.
    Paid,
    /// Shipped / handed over.
    Fulfilled,
    /// Cancelled before payment.
    Cancelled,
    /// Payment failed.
    Failed,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::AwaitingPayment,
        Self::Paid,
        Self::Fulfilled,
        Self::Cancelled,
        Self::Failed,
    ];

    /// Whether a transition from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::AwaitingPayment)
                | (Self::Pending | Self::AwaitingPayment, Self::Cancelled | Self::Failed)
                | (Self::Pending | Self::AwaitingPayment, Self::Paid)
                | (Self::Paid, Self::Fulfilled)
        )
    }

    /// Whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Cancelled | Self::Failed)
    }

    /// Database/API representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Paid => "paid",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "paid" => Ok(Self::Paid),
            "fulfilled" => Ok(Self::Fulfilled),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            other => Err(ParseStatusError {
                kind: "order",
                value: other.to_owned(),
            }),
        }
    }
}

/// Product availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProductStatus {
    /// Not visible on the storefront.
    #[default]
    Draft,
    /// Listed and purchasable.
    Available,
    /// Listed but not purchasable.
    SoldOut,
}

impl ProductStatus {
    /// Database/API representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Available => "available",
            Self::SoldOut => "sold-out",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "available" => Ok(Self::Available),
            "sold-out" => Ok(Self::SoldOut),
            other => Err(ParseStatusError {
                kind: "product",
                value: other.to_owned(),
            }),
        }
    }
}

/// Address purpose. Default flags are independent per kind: a customer has
/// at most one default shipping and one default billing address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Shipping,
    Billing,
}

impl AddressKind {
    /// Database/API representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Billing => "billing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::AwaitingPayment));
        assert!(OrderStatus::AwaitingPayment.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Fulfilled));
    }

    #[test]
    fn test_terminal_branches() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::AwaitingPayment.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::AwaitingPayment.can_transition_to(OrderStatus::Failed));

        for status in [
            OrderStatus::Fulfilled,
            OrderStatus::Cancelled,
            OrderStatus::Failed,
        ] {
            assert!(status.is_terminal());
            for next in OrderStatus::ALL {
                assert!(!status.can_transition_to(next), "{status} -> {next}");
            }
        }
    }

    #[test]
    fn test_no_backwards_transitions() {
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::AwaitingPayment));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Fulfilled.can_transition_to(OrderStatus::Paid));
    }

    #[test]
    fn test_order_status_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().expect("roundtrip"), status);
        }
    }

    #[test]
    fn test_product_status_roundtrip() {
        for status in [
            ProductStatus::Draft,
            ProductStatus::Available,
            ProductStatus::SoldOut,
        ] {
            assert_eq!(
                status.as_str().parse::<ProductStatus>().expect("roundtrip"),
                status
            );
        }
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&OrderStatus::AwaitingPayment).expect("serialize");
        assert_eq!(json, "\"awaiting_payment\"");
        let json = serde_json::to_string(&ProductStatus::SoldOut).expect("serialize");
        assert_eq!(json, "\"sold-out\"");
    }
}
