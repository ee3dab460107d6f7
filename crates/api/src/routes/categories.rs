//! Category routes.
//!
//! Reads are public and localized; writes require an authenticated caller.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use nixe_core::{CategoryId, Locale, Localized};

use crate::db::CategoryRepository;
use crate::db::categories::NewCategory;
use crate::error::{AppError, FieldError, Result};
use crate::middleware::{ClientLocale, RequireCustomer};
use crate::models::Category;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A category with localized fields resolved for one locale.
#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
    pub is_occasion: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryView {
    fn from_category(category: Category, locale: Locale) -> Self {
        Self {
            id: category.id,
            name: category.name.resolve(locale).to_owned(),
            slug: category.slug,
            parent_id: category.parent_id,
            is_occasion: category.is_occasion,
            image_url: category.image_url,
            description: category
                .description
                .map(|d| d.resolve(locale).to_owned()),
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Category creation payload.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name_fr: String,
    pub name_en: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub is_occasion: bool,
    pub image_url: Option<String>,
    pub description_fr: Option<String>,
    pub description_en: Option<String>,
}

/// Category update payload; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name_fr: Option<String>,
    pub name_en: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<Option<CategoryId>>,
    pub is_occasion: Option<bool>,
    pub image_url: Option<Option<String>>,
    pub description_fr: Option<String>,
    pub description_en: Option<String>,
}

fn validate_create(request: &CreateCategoryRequest) -> Result<()> {
    let mut errors = Vec::new();
    if request.name_fr.trim().is_empty() {
        errors.push(FieldError::new("name_fr", "must not be empty"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List all categories.
pub async fn list(
    State(state): State<AppState>,
    ClientLocale(locale): ClientLocale,
) -> Result<Json<Vec<CategoryView>>> {
    let categories = CategoryRepository::new(state.pool()).list_all().await?;
    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategoryView::from_category(c, locale))
            .collect(),
    ))
}

/// Get a category by ID.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    ClientLocale(locale): ClientLocale,
) -> Result<Json<CategoryView>> {
    let category = CategoryRepository::new(state.pool()).get(id).await?;
    Ok(Json(CategoryView::from_category(category, locale)))
}

/// Create a category.
pub async fn create(
    State(state): State<AppState>,
    _auth: RequireCustomer,
    ClientLocale(locale): ClientLocale,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryView>)> {
    validate_create(&request)?;

    let new = NewCategory {
        name: Localized {
            fr: request.name_fr,
            en: request.name_en,
        },
        slug: request.slug,
        parent_id: request.parent_id,
        is_occasion: request.is_occasion,
        image_url: request.image_url,
        description: request.description_fr.map(|fr| Localized {
            fr,
            en: request.description_en,
        }),
    };

    let category = CategoryRepository::new(state.pool()).create(&new).await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryView::from_category(category, locale)),
    ))
}

/// Update a category.
pub async fn update(
    State(state): State<AppState>,
    _auth: RequireCustomer,
    Path(id): Path<CategoryId>,
    ClientLocale(locale): ClientLocale,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryView>> {
    let repo = CategoryRepository::new(state.pool());
    let mut category = repo.get(id).await?;

    if let Some(name_fr) = request.name_fr {
        if name_fr.trim().is_empty() {
            return Err(AppError::Validation(vec![FieldError::new(
                "name_fr",
                "must not be empty",
            )]));
        }
        category.name.fr = name_fr;
    }
    if let Some(name_en) = request.name_en {
        category.name.en = Some(name_en);
    }
    if let Some(slug) = request.slug {
        category.slug = slug;
    }
    if let Some(parent_id) = request.parent_id {
        category.parent_id = parent_id;
    }
    if let Some(is_occasion) = request.is_occasion {
        category.is_occasion = is_occasion;
    }
    if let Some(image_url) = request.image_url {
        category.image_url = image_url;
    }
    if let Some(description_fr) = request.description_fr {
        let en = request
            .description_en
            .or_else(|| category.description.as_ref().and_then(|d| d.en.clone()));
        category.description = Some(Localized {
            fr: description_fr,
            en,
        });
    } else if let Some(description_en) = request.description_en {
        if let Some(description) = &mut category.description {
            description.en = Some(description_en);
        }
    }

    let category = repo.update(&category).await?;
    Ok(Json(CategoryView::from_category(category, locale)))
}
