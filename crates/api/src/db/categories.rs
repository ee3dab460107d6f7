//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use nixe_core::{CategoryId, Localized, slugify};

use super::{RepositoryError, map_unique_violation};
use crate::models::Category;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name_fr: String,
    name_en: Option<String>,
    slug: String,
    parent_id: Option<i32>,
    is_occasion: bool,
    image_url: Option<String>,
    description_fr: Option<String>,
    description_en: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: Localized {
                fr: row.name_fr,
                en: row.name_en,
            },
            slug: row.slug,
            parent_id: row.parent_id.map(CategoryId::new),
            is_occasion: row.is_occasion,
            image_url: row.image_url,
            description: row.description_fr.map(|fr| Localized {
                fr,
                en: row.description_en,
            }),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, name_fr, name_en, slug, parent_id, is_occasion, image_url, \
     description_fr, description_en, created_at, updated_at";

// =============================================================================
// Input Types
// =============================================================================

/// Fields for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: Localized,
    /// Derived from the French name when absent.
    pub slug: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub is_occasion: bool,
    pub image_url: Option<String>,
    pub description: Option<Localized>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories, top-level first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM categories ORDER BY parent_id NULLS FIRST, name_fr"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no category has this ID.
    pub async fn get(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Create a category. The slug falls back to the slugified French name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already taken.
    pub async fn create(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let slug = new
            .slug
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&new.name.fr));

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO categories \
                 (name_fr, name_en, slug, parent_id, is_occasion, image_url, \
                  description_fr, description_en) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&new.name.fr)
        .bind(&new.name.en)
        .bind(&slug)
        .bind(new.parent_id.map(|c| c.as_i32()))
        .bind(new.is_occasion)
        .bind(&new.image_url)
        .bind(new.description.as_ref().map(|d| &d.fr))
        .bind(new.description.as_ref().and_then(|d| d.en.as_ref()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "category slug already exists"))?;

        Ok(row.into())
    }

    /// Persist all mutable fields of a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category no longer exists.
    pub async fn update(&self, category: &Category) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE categories SET \
                 name_fr = $2, name_en = $3, slug = $4, parent_id = $5, \
                 is_occasion = $6, image_url = $7, description_fr = $8, \
                 description_en = $9, updated_at = now() \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(category.id.as_i32())
        .bind(&category.name.fr)
        .bind(&category.name.en)
        .bind(&category.slug)
        .bind(category.parent_id.map(|c| c.as_i32()))
        .bind(category.is_occasion)
        .bind(&category.image_url)
        .bind(category.description.as_ref().map(|d| &d.fr))
        .bind(category.description.as_ref().and_then(|d| d.en.as_ref()))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "category slug already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}
