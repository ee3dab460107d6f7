//! Order-pipeline saga steps.
//!
//! Order creation records its downstream effects (payment-intent creation,
//! customer back-reference) as rows in `order_sync_steps` instead of firing
//! them and swallowing failures. Each step is attempted once inline; the
//! background [`reconciler`] retries anything left pending and gives up
//! after [`MAX_ATTEMPTS`], leaving the step `failed` for operators.

pub mod reconciler;

use chrono::{DateTime, Utc};

use nixe_core::{OrderId, SyncStepId};

/// Retry budget per step, inline attempt included.
pub const MAX_ATTEMPTS: i32 = 5;

/// The downstream effect a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStepKind {
    /// Create the payment intent at the billing provider.
    PaymentIntentCreate,
    /// Append the order to the customer's `order_ids` back-reference.
    CustomerBackref,
    /// Push a new amount onto the existing payment intent after the order
    /// total changed.
    PaymentIntentAmount,
}

impl SyncStepKind {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentIntentCreate => "payment_intent_create",
            Self::CustomerBackref => "customer_backref",
            Self::PaymentIntentAmount => "payment_intent_amount",
        }
    }
}

impl std::str::FromStr for SyncStepKind {
    type Err = ParseSyncStepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment_intent_create" => Ok(Self::PaymentIntentCreate),
            "customer_backref" => Ok(Self::CustomerBackref),
            "payment_intent_amount" => Ok(Self::PaymentIntentAmount),
            _ => Err(ParseSyncStepError(s.to_owned())),
        }
    }
}

impl std::fmt::Display for SyncStepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStepStatus {
    /// Not yet completed; eligible for retry.
    Pending,
    /// Effect applied.
    Completed,
    /// Retry budget exhausted.
    Failed,
}

impl SyncStepStatus {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for SyncStepStatus {
    type Err = ParseSyncStepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseSyncStepError(s.to_owned())),
        }
    }
}

impl std::fmt::Display for SyncStepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized kind or status string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown sync step value: {0}")]
pub struct ParseSyncStepError(pub String);

/// A recorded saga step.
#[derive(Debug, Clone)]
pub struct SyncStep {
    pub id: SyncStepId,
    pub order_id: OrderId,
    pub kind: SyncStepKind,
    pub status: SyncStepStatus,
    /// Attempts so far, inline attempt included.
    pub attempts: i32,
    /// Error message from the last failed attempt.
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            SyncStepKind::PaymentIntentCreate,
            SyncStepKind::CustomerBackref,
            SyncStepKind::PaymentIntentAmount,
        ] {
            assert_eq!(kind.as_str().parse::<SyncStepKind>().ok(), Some(kind));
        }
        assert!("nope".parse::<SyncStepKind>().is_err());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            SyncStepStatus::Pending,
            SyncStepStatus::Completed,
            SyncStepStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<SyncStepStatus>().ok(), Some(status));
        }
        assert!("done".parse::<SyncStepStatus>().is_err());
    }
}
