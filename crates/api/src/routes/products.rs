//! Product routes.
//!
//! Reads are public (drafts hidden); writes require an authenticated
//! caller and trigger the billing sync hook. A sync failure never fails
//! the request: the local write already committed.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use nixe_core::{CategoryId, Locale, Localized, ProductId, ProductStatus};

use crate::db::ProductRepository;
use crate::db::products::{NewProduct, ProductFilter};
use crate::error::{AppError, FieldError, Result};
use crate::hooks;
use crate::middleware::{ClientLocale, RequireCustomer};
use crate::models::{Product, Specification};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A specification line resolved for one locale.
#[derive(Debug, Serialize)]
pub struct SpecificationView {
    pub label: String,
    pub value: String,
}

/// A product with localized fields resolved for one locale.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub is_occasion: bool,
    pub images: Vec<String>,
    pub status: ProductStatus,
    pub features: Vec<String>,
    pub specifications: Vec<SpecificationView>,
}

impl ProductView {
    fn from_product(product: Product, locale: Locale) -> Self {
        Self {
            id: product.id,
            title: product.title.resolve(locale).to_owned(),
            slug: product.slug,
            price: product.price,
            compare_at_price: product.compare_at_price,
            description: product
                .description
                .map(|d| d.resolve(locale).to_owned()),
            category_id: product.category_id,
            is_occasion: product.is_occasion,
            images: product.images,
            status: product.status,
            features: product
                .features
                .iter()
                .map(|f| f.resolve(locale).to_owned())
                .collect(),
            specifications: product
                .specifications
                .iter()
                .map(|s| SpecificationView {
                    label: s.label.resolve(locale).to_owned(),
                    value: s.value.resolve(locale).to_owned(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Listing filters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
}

/// A localized input value.
#[derive(Debug, Deserialize)]
pub struct LocalizedInput {
    pub fr: String,
    pub en: Option<String>,
}

impl From<LocalizedInput> for Localized {
    fn from(input: LocalizedInput) -> Self {
        Self {
            fr: input.fr,
            en: input.en,
        }
    }
}

/// A specification input line.
#[derive(Debug, Deserialize)]
pub struct SpecificationInput {
    pub label: LocalizedInput,
    pub value: LocalizedInput,
}

impl From<SpecificationInput> for Specification {
    fn from(input: SpecificationInput) -> Self {
        Self {
            label: input.label.into(),
            value: input.value.into(),
        }
    }
}

/// Product creation payload.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title_fr: String,
    pub title_en: Option<String>,
    pub slug: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub description_fr: Option<String>,
    pub description_en: Option<String>,
    pub category_id: CategoryId,
    #[serde(default)]
    pub is_occasion: bool,
    pub images: Vec<String>,
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub features: Vec<LocalizedInput>,
    #[serde(default)]
    pub specifications: Vec<SpecificationInput>,
}

/// Product update payload; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub title_fr: Option<String>,
    pub title_en: Option<String>,
    pub slug: Option<String>,
    pub price: Option<Decimal>,
    pub compare_at_price: Option<Option<Decimal>>,
    pub description_fr: Option<String>,
    pub description_en: Option<String>,
    pub category_id: Option<CategoryId>,
    pub is_occasion: Option<bool>,
    pub images: Option<Vec<String>>,
    pub status: Option<ProductStatus>,
    pub features: Option<Vec<LocalizedInput>>,
    pub specifications: Option<Vec<SpecificationInput>>,
}

fn validate_price(price: Decimal, errors: &mut Vec<FieldError>) {
    if price.is_sign_negative() {
        errors.push(FieldError::new("price", "must be at least 0"));
    }
}

fn validate_images(images: &[String], errors: &mut Vec<FieldError>) {
    if images.is_empty() {
        errors.push(FieldError::new("images", "at least one image is required"));
    }
    if images.len() > Product::MAX_IMAGES {
        errors.push(FieldError::new(
            "images",
            format!("at most {} images are allowed", Product::MAX_IMAGES),
        ));
    }
}

fn validate_create(request: &CreateProductRequest) -> Result<()> {
    let mut errors = Vec::new();
    if request.title_fr.trim().is_empty() {
        errors.push(FieldError::new("title_fr", "must not be empty"));
    }
    validate_price(request.price, &mut errors);
    validate_images(&request.images, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

// =============================================================================
// Sync
// =============================================================================

/// Run the billing sync hook and persist its outcome. Failures are logged
/// and swallowed; billing being unconfigured skips with a warning.
async fn sync_and_persist(state: &AppState, product: &Product, previous_price: Option<Decimal>) {
    let Some(provider) = state.billing() else {
        warn!(product_id = %product.id, "billing not configured, skipping product sync");
        return;
    };

    match hooks::sync_product(provider.as_ref(), product, previous_price, state.public_base()).await
    {
        Ok(outcome) => {
            let result = ProductRepository::new(state.pool())
                .set_billing_ids(
                    product.id,
                    &outcome.billing_product_id,
                    outcome.billing_price_id.as_deref(),
                )
                .await;
            if let Err(e) = result {
                warn!(product_id = %product.id, error = %e, "failed to persist billing product IDs");
            }
        }
        Err(e) => {
            warn!(product_id = %product.id, error = %e, "product billing sync failed");
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List products. Drafts are hidden unless explicitly filtered.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    ClientLocale(locale): ClientLocale,
) -> Result<Json<Vec<ProductView>>> {
    let filter = ProductFilter {
        category_id: query.category_id,
        status: query.status,
        exclude_drafts: query.status.is_none(),
    };

    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| ProductView::from_product(p, locale))
            .collect(),
    ))
}

/// Get a product by ID.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    ClientLocale(locale): ClientLocale,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool()).get(id).await?;
    Ok(Json(ProductView::from_product(product, locale)))
}

/// Create a product and mirror it to the billing provider.
pub async fn create(
    State(state): State<AppState>,
    _auth: RequireCustomer,
    ClientLocale(locale): ClientLocale,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductView>)> {
    validate_create(&request)?;

    let new = NewProduct {
        title: Localized {
            fr: request.title_fr,
            en: request.title_en,
        },
        slug: request.slug,
        price: request.price,
        compare_at_price: request.compare_at_price,
        description: request.description_fr.map(|fr| Localized {
            fr,
            en: request.description_en,
        }),
        category_id: request.category_id,
        is_occasion: request.is_occasion,
        images: request.images,
        status: request.status.unwrap_or(ProductStatus::Draft),
        features: request.features.into_iter().map(Into::into).collect(),
        specifications: request.specifications.into_iter().map(Into::into).collect(),
    };

    let product = ProductRepository::new(state.pool()).create(&new).await?;
    sync_and_persist(&state, &product, None).await;

    Ok((
        StatusCode::CREATED,
        Json(ProductView::from_product(product, locale)),
    ))
}

/// Update a product. A price change rotates the remote billing price.
pub async fn update(
    State(state): State<AppState>,
    _auth: RequireCustomer,
    Path(id): Path<ProductId>,
    ClientLocale(locale): ClientLocale,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ProductView>> {
    let repo = ProductRepository::new(state.pool());
    let mut product = repo.get(id).await?;
    let previous_price = product.price;

    let mut errors = Vec::new();
    if let Some(price) = request.price {
        validate_price(price, &mut errors);
    }
    if let Some(images) = &request.images {
        validate_images(images, &mut errors);
    }
    if let Some(title_fr) = &request.title_fr {
        if title_fr.trim().is_empty() {
            errors.push(FieldError::new("title_fr", "must not be empty"));
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if let Some(title_fr) = request.title_fr {
        product.title.fr = title_fr;
    }
    if let Some(title_en) = request.title_en {
        product.title.en = Some(title_en);
    }
    if let Some(slug) = request.slug {
        product.slug = slug;
    }
    if let Some(price) = request.price {
        product.price = price;
    }
    if let Some(compare_at_price) = request.compare_at_price {
        product.compare_at_price = compare_at_price;
    }
    if let Some(description_fr) = request.description_fr {
        let en = request
            .description_en
            .or_else(|| product.description.as_ref().and_then(|d| d.en.clone()));
        product.description = Some(Localized {
            fr: description_fr,
            en,
        });
    } else if let Some(description_en) = request.description_en {
        if let Some(description) = &mut product.description {
            description.en = Some(description_en);
        }
    }
    if let Some(category_id) = request.category_id {
        product.category_id = category_id;
    }
    if let Some(is_occasion) = request.is_occasion {
        product.is_occasion = is_occasion;
    }
    if let Some(images) = request.images {
        product.images = images;
    }
    if let Some(status) = request.status {
        product.status = status;
    }
    if let Some(features) = request.features {
        product.features = features.into_iter().map(Into::into).collect();
    }
    if let Some(specifications) = request.specifications {
        product.specifications = specifications.into_iter().map(Into::into).collect();
    }

    let product = repo.update(&product).await?;
    sync_and_persist(&state, &product, Some(previous_price)).await;

    Ok(Json(ProductView::from_product(product, locale)))
}
