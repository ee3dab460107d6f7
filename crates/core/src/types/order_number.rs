//! Human-readable order numbers.
//!
//! Format: `NX-{YYYY}{MM}{last 6 digits of epoch-ms}-{3-digit random}`,
//! e.g. `NX-202506123456-042`. Sortable by creation month.
//!
//! Not guaranteed globally unique: two orders created within the same
//! millisecond-truncation window can collide on the random draw. The
//! database unique index is the only backstop; a collision surfaces as a
//! conflict at insert time.

use core::fmt;

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderNumberError {
    /// Missing the `NX-` prefix.
    #[error("order number must start with NX-")]
    MissingPrefix,
    /// The body or suffix has the wrong shape.
    #[error("order number must match NX-{{12 digits}}-{{3 digits}}")]
    BadFormat,
    /// The embedded month is not 01-12.
    #[error("order number month component out of range")]
    BadMonth,
}

/// A generated order number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate an order number for the current instant.
    #[must_use]
    pub fn generate() -> Self {
        let draw = rand::rng().random_range(0..1000);
        Self::generate_at(Utc::now(), draw)
    }

    /// Generate an order number from an explicit timestamp and random draw.
    ///
    /// `draw` is taken modulo 1000.
    #[must_use]
    pub fn generate_at(now: DateTime<Utc>, draw: u16) -> Self {
        let timestamp = now.timestamp_millis().rem_euclid(1_000_000);
        Self(format!(
            "NX-{:04}{:02}{timestamp:06}-{:03}",
            now.year(),
            now.month(),
            draw % 1000
        ))
    }

    /// Parse and validate an order number.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError`] if the string does not match
    /// `NX-\d{12}-\d{3}` or embeds an invalid month.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let rest = s.strip_prefix("NX-").ok_or(OrderNumberError::MissingPrefix)?;

        let (body, suffix) = rest.split_once('-').ok_or(OrderNumberError::BadFormat)?;
        if body.len() != 12 || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::BadFormat);
        }
        if suffix.len() != 3 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::BadFormat);
        }

        let month: u32 = body
            .get(4..6)
            .and_then(|m| m.parse().ok())
            .ok_or(OrderNumberError::BadFormat)?;
        if !(1..=12).contains(&month) {
            return Err(OrderNumberError::BadMonth);
        }

        Ok(Self(s.to_owned()))
    }

    /// Get the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `(year, month)` the order number was generated in.
    #[must_use]
    pub fn year_month(&self) -> Option<(i32, u32)> {
        let year = self.0.get(3..7)?.parse().ok()?;
        let month = self.0.get(7..9)?.parse().ok()?;
        Some((year, month))
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_at_format() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 45).single().expect("valid date");
        let number = OrderNumber::generate_at(now, 42);

        let s = number.as_str();
        assert!(s.starts_with("NX-202506"));
        assert!(s.ends_with("-042"));
        assert_eq!(s.len(), "NX-".len() + 12 + "-".len() + 3);
    }

    #[test]
    fn test_generate_roundtrips_through_parse() {
        let number = OrderNumber::generate();
        let parsed = OrderNumber::parse(number.as_str()).expect("generated numbers are valid");
        assert_eq!(parsed, number);
    }

    #[test]
    fn test_month_component_matches_creation_month() {
        let now = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).single().expect("valid date");
        let number = OrderNumber::generate_at(now, 7);
        assert_eq!(number.year_month(), Some((2025, 11)));
    }

    #[test]
    fn test_draw_wraps_modulo_1000() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid date");
        let number = OrderNumber::generate_at(now, 999);
        assert!(number.as_str().ends_with("-999"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            OrderNumber::parse("ZZ-202506123456-042"),
            Err(OrderNumberError::MissingPrefix)
        ));
        assert!(matches!(
            OrderNumber::parse("NX-2025061234-042"),
            Err(OrderNumberError::BadFormat)
        ));
        assert!(matches!(
            OrderNumber::parse("NX-202506123456-42"),
            Err(OrderNumberError::BadFormat)
        ));
        assert!(matches!(
            OrderNumber::parse("NX-202513123456-042"),
            Err(OrderNumberError::BadMonth)
        ));
    }
}
