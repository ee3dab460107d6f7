//! Core types for Nixe.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod locale;
pub mod money;
pub mod order_number;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use locale::{Locale, Localized, ParseLocaleError};
pub use money::{MinorUnitsError, OrderTotals, to_minor_units};
pub use order_number::{OrderNumber, OrderNumberError};
pub use slug::slugify;
pub use status::*;
