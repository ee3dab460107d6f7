//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use nixe_core::{CategoryId, Localized, ProductId, ProductStatus};

use super::{RepositoryError, map_unique_violation};
use crate::models::{Product, Specification};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title_fr: String,
    title_en: Option<String>,
    slug: String,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    description_fr: Option<String>,
    description_en: Option<String>,
    category_id: i32,
    is_occasion: bool,
    images: Vec<String>,
    status: String,
    billing_product_id: Option<String>,
    billing_price_id: Option<String>,
    features: Json<Vec<Localized>>,
    specifications: Json<Vec<Specification>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<ProductStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product status in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            title: Localized {
                fr: row.title_fr,
                en: row.title_en,
            },
            slug: row.slug,
            price: row.price,
            compare_at_price: row.compare_at_price,
            description: row.description_fr.map(|fr| Localized {
                fr,
                en: row.description_en,
            }),
            category_id: CategoryId::new(row.category_id),
            is_occasion: row.is_occasion,
            images: row.images,
            status,
            billing_product_id: row.billing_product_id,
            billing_price_id: row.billing_price_id,
            features: row.features.0,
            specifications: row.specifications.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, title_fr, title_en, slug, price, compare_at_price, \
     description_fr, description_en, category_id, is_occasion, images, status, \
     billing_product_id, billing_price_id, features, specifications, \
     created_at, updated_at";

// =============================================================================
// Input Types
// =============================================================================

/// Filters for product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
    /// Exclude drafts (the public listing).
    pub exclude_drafts: bool,
}

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: Localized,
    /// Derived from the French title when absent.
    pub slug: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub description: Option<Localized>,
    pub category_id: CategoryId,
    pub is_occasion: bool,
    pub images: Vec<String>,
    pub status: ProductStatus,
    pub features: Vec<Localized>,
    pub specifications: Vec<Specification>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products \
             WHERE ($1::int IS NULL OR category_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
               AND (NOT $3 OR status <> 'draft') \
             ORDER BY created_at DESC"
        ))
        .bind(filter.category_id.map(|c| c.as_i32()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.exclude_drafts)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    pub async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Create a product. The slug falls back to the slugified French title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already taken.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let slug = new
            .slug
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| nixe_core::slugify(&new.title.fr));

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products \
                 (title_fr, title_en, slug, price, compare_at_price, \
                  description_fr, description_en, category_id, is_occasion, \
                  images, status, features, specifications) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&new.title.fr)
        .bind(&new.title.en)
        .bind(&slug)
        .bind(new.price)
        .bind(new.compare_at_price)
        .bind(new.description.as_ref().map(|d| &d.fr))
        .bind(new.description.as_ref().and_then(|d| d.en.as_ref()))
        .bind(new.category_id.as_i32())
        .bind(new.is_occasion)
        .bind(&new.images)
        .bind(new.status.as_str())
        .bind(Json(&new.features))
        .bind(Json(&new.specifications))
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "product slug already exists"))?;

        row.try_into()
    }

    /// Persist all mutable fields of a product (billing IDs excluded; those
    /// go through [`Self::set_billing_ids`]).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product no longer exists.
    pub async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET \
                 title_fr = $2, title_en = $3, slug = $4, price = $5, \
                 compare_at_price = $6, description_fr = $7, description_en = $8, \
                 category_id = $9, is_occasion = $10, images = $11, status = $12, \
                 features = $13, specifications = $14, updated_at = now() \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(product.id.as_i32())
        .bind(&product.title.fr)
        .bind(&product.title.en)
        .bind(&product.slug)
        .bind(product.price)
        .bind(product.compare_at_price)
        .bind(product.description.as_ref().map(|d| &d.fr))
        .bind(product.description.as_ref().and_then(|d| d.en.as_ref()))
        .bind(product.category_id.as_i32())
        .bind(product.is_occasion)
        .bind(&product.images)
        .bind(product.status.as_str())
        .bind(Json(&product.features))
        .bind(Json(&product.specifications))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "product slug already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Persist the remote billing IDs after a sync.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product no longer exists.
    pub async fn set_billing_ids(
        &self,
        id: ProductId,
        billing_product_id: &str,
        billing_price_id: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET \
                 billing_product_id = $2, \
                 billing_price_id = COALESCE($3, billing_price_id), \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(billing_product_id)
        .bind(billing_price_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
