//! Category domain types.

use chrono::{DateTime, Utc};

use nixe_core::{CategoryId, Localized};

/// A catalog category.
///
/// Categories form a tree via `parent_id` (acyclicity is not enforced).
/// The slug is auto-derived from the French name when not provided.
#[derive(Debug, Clone)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Localized display name.
    pub name: Localized,
    /// URL slug.
    pub slug: String,
    /// Parent category, `None` for top-level categories.
    pub parent_id: Option<CategoryId>,
    /// Whether this category holds second-hand items.
    pub is_occasion: bool,
    /// Category image URL.
    pub image_url: Option<String>,
    /// Localized description.
    pub description: Option<Localized>,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}
