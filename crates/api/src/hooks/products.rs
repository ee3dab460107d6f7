//! Product sync hook.
//!
//! Mirrors catalog products into the provider's product/price model. The
//! remote price model is append-only: a price change deactivates the old
//! remote price and creates a new one, and the stored `billing_price_id`
//! always points at the latest.

use rust_decimal::Decimal;
use tracing::{debug, warn};
use url::Url;

use nixe_core::to_minor_units;

use crate::billing::{BillingError, BillingProvider, ProductFields};
use crate::models::Product;

/// What the product sync did. The caller persists both IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSyncOutcome {
    /// Remote product ID (existing or freshly created).
    pub billing_product_id: String,
    /// New remote price ID, when a price was (re)created this sync.
    pub billing_price_id: Option<String>,
}

/// Build the provider payload from a product.
///
/// Image URLs are made absolute against the public base URL; entries that
/// are already absolute pass through unchanged.
fn product_fields(product: &Product, public_base: &Url) -> ProductFields {
    let image_urls = product
        .images
        .iter()
        .map(|image| {
            public_base
                .join(image)
                .map_or_else(|_| image.clone(), String::from)
        })
        .collect();

    ProductFields {
        local_id: product.id,
        name: product.title.fr.clone(),
        description: product
            .description
            .as_ref()
            .map(|d| d.fr.clone())
            .unwrap_or_default(),
        active: product.is_active(),
        image_urls,
    }
}

/// Mirror a product to the billing provider.
///
/// `previous_price` is the unit price before the local write; a change
/// versus the current price triggers the price rotation. Deactivation
/// failure is tolerated: the old price may stay active remotely, but the
/// new price is still created so the stored ID keeps moving forward.
///
/// # Errors
///
/// Returns [`BillingError`] if a product or price creation call fails.
/// The caller logs and swallows it; the local write is never reverted.
pub async fn sync_product(
    provider: &dyn BillingProvider,
    product: &Product,
    previous_price: Option<Decimal>,
    public_base: &Url,
) -> Result<ProductSyncOutcome, BillingError> {
    let fields = product_fields(product, public_base);

    let billing_product_id = match &product.billing_product_id {
        Some(remote_id) => {
            provider.update_product(remote_id, &fields).await?;
            debug!(product_id = %product.id, %remote_id, "updated billing product");
            remote_id.clone()
        }
        None => {
            let remote = provider.create_product(&fields).await?;
            debug!(product_id = %product.id, remote_id = %remote.id, "created billing product");
            remote.id
        }
    };

    let price_changed = previous_price != Some(product.price);
    let needs_price = product.billing_price_id.is_none() || price_changed;
    if !needs_price {
        return Ok(ProductSyncOutcome {
            billing_product_id,
            billing_price_id: None,
        });
    }

    if let Some(old_price_id) = &product.billing_price_id {
        if let Err(e) = provider.deactivate_price(old_price_id).await {
            warn!(
                product_id = %product.id,
                %old_price_id,
                error = %e,
                "failed to deactivate old billing price, creating replacement anyway"
            );
        }
    }

    let amount_minor = to_minor_units(product.price)?;
    let price = provider.create_price(&billing_product_id, amount_minor).await?;
    debug!(product_id = %product.id, price_id = %price.id, "created billing price");

    Ok(ProductSyncOutcome {
        billing_product_id,
        billing_price_id: Some(price.id),
    })
}
