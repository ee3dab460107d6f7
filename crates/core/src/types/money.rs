//! Order money math.
//!
//! All amounts use [`rust_decimal::Decimal`] in the currency's standard
//! unit (euros). The billing provider wants minor units (cents), converted
//! via [`to_minor_units`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// French VAT rate applied to all orders (20%).
pub const TAX_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Computed order totals, written back onto the order before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of `price * quantity` over all line items.
    pub subtotal: Decimal,
    /// 20% of the subtotal, rounded half-up to cents.
    pub tax: Decimal,
    /// `subtotal + tax + shipping_cost`.
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals from line items and a shipping cost.
    ///
    /// An empty item list yields a zero subtotal and zero tax. Negative
    /// prices or quantities are not defended against here; field-level
    /// minimums are enforced at the validation boundary.
    #[must_use]
    pub fn compute<I>(items: I, shipping_cost: Option<Decimal>) -> Self
    where
        I: IntoIterator<Item = (Decimal, i32)>,
    {
        let subtotal: Decimal = items
            .into_iter()
            .map(|(price, quantity)| price * Decimal::from(quantity))
            .sum();

        let tax = (subtotal * TAX_RATE)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let total = subtotal + tax + shipping_cost.unwrap_or(Decimal::ZERO);

        Self {
            subtotal,
            tax,
            total,
        }
    }
}

/// Error converting an amount to minor currency units.
#[derive(Debug, Clone, thiserror::Error)]
#[error("amount {0} cannot be represented in minor units")]
pub struct MinorUnitsError(pub Decimal);

/// Convert an amount in euros to minor units (cents) for the billing
/// provider, rounding half-up.
///
/// # Errors
///
/// Returns [`MinorUnitsError`] if the amount does not fit in an `i64`
/// after conversion.
pub fn to_minor_units(amount: Decimal) -> Result<i64, MinorUnitsError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(MinorUnitsError(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    #[test]
    fn test_tax_rate_is_twenty_percent() {
        assert_eq!(TAX_RATE, dec("0.20"));
    }

    #[test]
    fn test_compute_worked_example() {
        // items=[{price:100,quantity:2},{price:50,quantity:1}], shipping 10
        let totals = OrderTotals::compute(
            vec![(dec("100"), 2), (dec("50"), 1)],
            Some(dec("10")),
        );
        assert_eq!(totals.subtotal, dec("250"));
        assert_eq!(totals.tax, dec("50.00"));
        assert_eq!(totals.total, dec("310.00"));
    }

    #[test]
    fn test_compute_empty_items() {
        let totals = OrderTotals::compute(Vec::new(), None);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_compute_shipping_defaults_to_zero() {
        let totals = OrderTotals::compute(vec![(dec("10"), 1)], None);
        assert_eq!(totals.total, dec("12.00"));
    }

    #[test]
    fn test_tax_rounds_half_up_to_cents() {
        // subtotal 10.01 -> raw tax 2.002 -> 2.00
        let totals = OrderTotals::compute(vec![(dec("10.01"), 1)], None);
        assert_eq!(totals.tax, dec("2.00"));

        // subtotal 0.13 -> raw tax 0.026 -> 0.03
        let totals = OrderTotals::compute(vec![(dec("0.13"), 1)], None);
        assert_eq!(totals.tax, dec("0.03"));

        // subtotal 1.25 -> raw tax 0.250 -> exact
        let totals = OrderTotals::compute(vec![(dec("1.25"), 1)], None);
        assert_eq!(totals.tax, dec("0.25"));
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(dec("310.00")).expect("cents"), 31000);
        assert_eq!(to_minor_units(dec("19.99")).expect("cents"), 1999);
        assert_eq!(to_minor_units(dec("0.005")).expect("cents"), 1);
    }
}
