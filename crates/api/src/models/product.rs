//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use nixe_core::{CategoryId, Localized, ProductId, ProductStatus};

/// A localized specification line (label/value pair).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specification {
    pub label: Localized,
    pub value: Localized,
}

/// A catalog product.
///
/// `billing_product_id` and `billing_price_id` mirror the product into the
/// billing provider; they are populated asynchronously after the first
/// sync, never by the caller.
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Localized title.
    pub title: Localized,
    /// URL slug.
    pub slug: String,
    /// Unit price in euros. Never negative.
    pub price: Decimal,
    /// Original price for sale items.
    pub compare_at_price: Option<Decimal>,
    /// Localized description.
    pub description: Option<Localized>,
    /// Owning category (exactly one).
    pub category_id: CategoryId,
    /// Whether this is a second-hand item.
    pub is_occasion: bool,
    /// Image URLs, 1 to 10 entries.
    pub images: Vec<String>,
    /// Availability status.
    pub status: ProductStatus,
    /// Remote product ID at the billing provider.
    pub billing_product_id: Option<String>,
    /// Remote price ID at the billing provider (append-only remote model;
    /// always points at the latest active price).
    pub billing_price_id: Option<String>,
    /// Localized marketing features.
    pub features: Vec<Localized>,
    /// Localized specification lines.
    pub specifications: Vec<Specification>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Maximum number of images per product.
    pub const MAX_IMAGES: usize = 10;

    /// Whether the product should be active at the billing provider.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, ProductStatus::Available)
    }
}
