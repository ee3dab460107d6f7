//! Customer routes.
//!
//! Customers can only read and update themselves; address management goes
//! through the update payload.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nixe_core::{CustomerId, Locale, OrderId};

use crate::db::CustomerRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireCustomer;
use crate::models::{Address, Customer};
use crate::routes::auth::sync_and_persist;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A customer profile as returned to its owner.
#[derive(Debug, Serialize)]
pub struct CustomerView {
    pub id: CustomerId,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub preferred_language: Locale,
    pub addresses: Vec<Address>,
    pub order_ids: Vec<OrderId>,
    pub api_key: Uuid,
}

impl From<Customer> for CustomerView {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email.as_str().to_owned(),
            name: customer.name,
            phone: customer.phone,
            preferred_language: customer.preferred_language,
            addresses: customer.addresses,
            order_ids: customer.order_ids,
            api_key: customer.api_key,
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Customer update payload; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub preferred_language: Option<Locale>,
    pub addresses: Option<Vec<Address>>,
}

// =============================================================================
// Handlers
// =============================================================================

fn ensure_self(current: CustomerId, requested: CustomerId) -> Result<()> {
    if current == requested {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "customers can only access their own account".to_owned(),
        ))
    }
}

/// Get a customer (self only).
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(current): RequireCustomer,
    Path(id): Path<CustomerId>,
) -> Result<Json<CustomerView>> {
    ensure_self(current.id, id)?;

    let customer = CustomerRepository::new(state.pool()).get(id).await?;
    Ok(Json(CustomerView::from(customer)))
}

/// Update a customer (self only) and re-sync to the billing provider.
pub async fn update(
    State(state): State<AppState>,
    RequireCustomer(current): RequireCustomer,
    Path(id): Path<CustomerId>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerView>> {
    ensure_self(current.id, id)?;

    let repo = CustomerRepository::new(state.pool());
    let mut customer = repo.get(id).await?;

    if let Some(name) = request.name {
        customer.name = name;
    }
    if let Some(phone) = request.phone {
        customer.phone = phone;
    }
    if let Some(preferred_language) = request.preferred_language {
        customer.preferred_language = preferred_language;
    }
    if let Some(addresses) = request.addresses {
        customer.addresses = addresses;
    }

    let customer = repo.update(&customer).await?;
    sync_and_persist(&state, &customer).await;

    Ok(Json(CustomerView::from(customer)))
}
