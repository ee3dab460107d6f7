//! Order routes.
//!
//! Checkout snapshots catalog data into the order, computes totals,
//! generates the order number and records the downstream saga steps. The
//! caller sees a created order even when billing sync is still pending or
//! failing; the reconciler keeps retrying behind the scenes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use nixe_core::{CustomerId, OrderId, OrderNumber, OrderStatus, ProductId};

use crate::db::{
    CustomerRepository, OrderRepository, ProductRepository, RepositoryError, SyncStepRepository,
};
use crate::db::orders::NewOrder;
use crate::error::{AppError, FieldError, Result};
use crate::middleware::{ClientLocale, OptionalCustomer, RequireCustomer};
use crate::models::{AddressSnapshot, CurrentCustomer, Order, OrderItem, compute_item_totals};
use crate::state::AppState;
use crate::sync::{SyncStepKind, reconciler};

// =============================================================================
// Views
// =============================================================================

/// An order as returned to its owner.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub order_number: String,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.as_str().to_owned(),
            customer_id: order.customer_id,
            items: order.items,
            status: order.status,
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping_cost: order.shipping_cost,
            total: order.total,
            client_secret: order.client_secret,
            payment_error: order.payment_error,
            paid_at: order.paid_at,
            notes: order.notes,
            created_at: order.created_at,
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// A checkout line: the catalog product and a quantity. Title and price
/// are snapshotted server-side.
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Checkout payload.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// The ordering customer. Required for guest checkout; an
    /// authenticated caller may omit it.
    pub customer_id: Option<CustomerId>,
    pub items: Vec<CheckoutItem>,
    pub shipping_address: AddressSnapshot,
    /// Defaults to the shipping address.
    pub billing_address: Option<AddressSnapshot>,
    pub shipping_cost: Option<Decimal>,
    pub notes: Option<String>,
}

/// Order update payload; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    /// Replacement line items (snapshots; prices are not re-read from the
    /// catalog).
    pub items: Option<Vec<OrderItem>>,
    pub shipping_cost: Option<Decimal>,
    pub notes: Option<String>,
}

fn validate_checkout(request: &CreateOrderRequest) -> Result<()> {
    let mut errors = Vec::new();
    if request.items.is_empty() {
        errors.push(FieldError::new("items", "at least one item is required"));
    }
    for (i, item) in request.items.iter().enumerate() {
        if item.quantity < 1 {
            errors.push(FieldError::new(
                format!("items.{i}.quantity"),
                "must be at least 1",
            ));
        }
    }
    if let Some(shipping_cost) = request.shipping_cost {
        if shipping_cost.is_sign_negative() {
            errors.push(FieldError::new("shipping_cost", "must be at least 0"));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Checkout is open: a session is not required, but a guest must name the
/// customer the order belongs to. An authenticated caller is always the
/// customer, and cannot place orders for someone else.
fn resolve_checkout_customer(
    auth: Option<&CurrentCustomer>,
    requested: Option<CustomerId>,
) -> Result<CustomerId> {
    match (auth, requested) {
        (Some(current), Some(id)) if id != current.id => Err(AppError::Forbidden(
            "customers can only place orders for themselves".to_owned(),
        )),
        (Some(current), _) => Ok(current.id),
        (None, Some(id)) => Ok(id),
        (None, None) => Err(AppError::Validation(vec![FieldError::new(
            "customer_id",
            "required when not authenticated",
        )])),
    }
}

fn snapshot_failure(index: usize, err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::Validation(vec![FieldError::new(
            format!("items.{index}.product_id"),
            "unknown product",
        )]),
        other => AppError::Database(other),
    }
}

fn ensure_owner(order: &Order, customer_id: CustomerId) -> Result<()> {
    if order.customer_id == customer_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "customers can only access their own orders".to_owned(),
        ))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Checkout: create an order from catalog products.
pub async fn create(
    State(state): State<AppState>,
    OptionalCustomer(current): OptionalCustomer,
    ClientLocale(locale): ClientLocale,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    validate_checkout(&request)?;

    let customer_id = resolve_checkout_customer(current.as_ref(), request.customer_id)?;
    CustomerRepository::new(state.pool())
        .get(customer_id)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => {
                AppError::Validation(vec![FieldError::new("customer_id", "unknown customer")])
            }
            other => AppError::Database(other),
        })?;

    // Snapshot titles and prices at purchase time.
    let products = ProductRepository::new(state.pool());
    let mut items = Vec::with_capacity(request.items.len());
    for (i, line) in request.items.iter().enumerate() {
        let product = products
            .get(line.product_id)
            .await
            .map_err(|err| snapshot_failure(i, err))?;
        if !product.is_active() {
            return Err(AppError::Validation(vec![FieldError::new(
                format!("items.{i}.product_id"),
                "product is not available",
            )]));
        }
        items.push(OrderItem {
            product_id: product.id,
            title: product.title.resolve(locale).to_owned(),
            price: product.price,
            quantity: line.quantity,
        });
    }

    let shipping_cost = request.shipping_cost.unwrap_or_default();
    let totals = compute_item_totals(&items, Some(shipping_cost));

    let shipping_address = request.shipping_address;
    let billing_address = request
        .billing_address
        .unwrap_or_else(|| shipping_address.clone());

    let new = NewOrder {
        order_number: OrderNumber::generate(),
        customer_id,
        items,
        status: OrderStatus::Pending,
        shipping_address,
        billing_address,
        totals,
        shipping_cost,
        notes: request.notes,
    };

    let orders = OrderRepository::new(state.pool());
    let order = orders.create(&new).await?;

    // Record the saga steps, then run the inline first attempt.
    let steps = SyncStepRepository::new(state.pool());
    steps.enqueue(order.id, SyncStepKind::CustomerBackref).await?;
    if state.billing().is_some() {
        steps
            .enqueue(order.id, SyncStepKind::PaymentIntentCreate)
            .await?;
    } else {
        warn!(order_id = %order.id, "billing not configured, skipping payment intent");
    }
    reconciler::run_pending(&state).await;

    // Re-read to pick up the client secret when the inline attempt
    // succeeded.
    let order = orders.get(order.id).await?;
    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}

/// List the current customer's orders.
pub async fn list(
    State(state): State<AppState>,
    RequireCustomer(current): RequireCustomer,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(current.id)
        .await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// Get an order (owner only).
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(current): RequireCustomer,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = OrderRepository::new(state.pool()).get(id).await?;
    ensure_owner(&order, current.id)?;
    Ok(Json(OrderView::from(order)))
}

/// Update an order (owner only). Status changes are validated against the
/// transition table; item or shipping changes recompute totals and push
/// the new amount onto an existing payment intent.
pub async fn update(
    State(state): State<AppState>,
    RequireCustomer(current): RequireCustomer,
    Path(id): Path<OrderId>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<OrderView>> {
    let repo = OrderRepository::new(state.pool());
    let mut order = repo.get(id).await?;
    ensure_owner(&order, current.id)?;

    let previous_total = order.total;

    if let Some(status) = request.status {
        if status != order.status && !order.status.can_transition_to(status) {
            return Err(AppError::BadRequest(format!(
                "cannot transition order from {} to {}",
                order.status, status
            )));
        }
        order.status = status;
    }

    let mut money_changed = false;
    if let Some(items) = request.items {
        let mut errors = Vec::new();
        if items.is_empty() {
            errors.push(FieldError::new("items", "at least one item is required"));
        }
        for (i, item) in items.iter().enumerate() {
            if item.quantity < 1 {
                errors.push(FieldError::new(
                    format!("items.{i}.quantity"),
                    "must be at least 1",
                ));
            }
            if item.price.is_sign_negative() {
                errors.push(FieldError::new(
                    format!("items.{i}.price"),
                    "must be at least 0",
                ));
            }
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        order.items = items;
        money_changed = true;
    }
    if let Some(shipping_cost) = request.shipping_cost {
        if shipping_cost.is_sign_negative() {
            return Err(AppError::Validation(vec![FieldError::new(
                "shipping_cost",
                "must be at least 0",
            )]));
        }
        order.shipping_cost = shipping_cost;
        money_changed = true;
    }
    if let Some(notes) = request.notes {
        order.notes = Some(notes);
    }

    if money_changed {
        let totals = order.compute_totals();
        order.subtotal = totals.subtotal;
        order.tax = totals.tax;
        order.total = totals.total;
    }

    let order = repo.update(&order).await?;

    // Only a changed total triggers a billing push.
    if order.total != previous_total && order.billing_payment_intent_id.is_some() {
        SyncStepRepository::new(state.pool())
            .enqueue(order.id, SyncStepKind::PaymentIntentAmount)
            .await?;
        reconciler::run_pending(&state).await;
    }

    Ok(Json(OrderView::from(order)))
}

#[cfg(test)]
mod tests {
    use nixe_core::Email;

    use super::*;

    fn logged_in(id: i32) -> CurrentCustomer {
        CurrentCustomer {
            id: CustomerId::new(id),
            email: Email::parse("rider@nixesurf.fr").expect("valid email"),
        }
    }

    #[test]
    fn test_guest_checkout_uses_the_named_customer() {
        assert_eq!(
            resolve_checkout_customer(None, Some(CustomerId::new(7))).ok(),
            Some(CustomerId::new(7))
        );
    }

    #[test]
    fn test_authenticated_checkout_is_always_the_caller() {
        let me = logged_in(3);
        assert_eq!(
            resolve_checkout_customer(Some(&me), None).ok(),
            Some(CustomerId::new(3))
        );
        assert_eq!(
            resolve_checkout_customer(Some(&me), Some(CustomerId::new(3))).ok(),
            Some(CustomerId::new(3))
        );
    }

    #[test]
    fn test_checkout_rejects_mismatched_or_missing_customer() {
        let me = logged_in(3);
        assert!(matches!(
            resolve_checkout_customer(Some(&me), Some(CustomerId::new(4))),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            resolve_checkout_customer(None, None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_snapshot_failure_maps_only_missing_products_to_validation() {
        assert!(matches!(
            snapshot_failure(0, RepositoryError::NotFound),
            AppError::Validation(_)
        ));
        assert!(matches!(
            snapshot_failure(
                0,
                RepositoryError::DataCorruption("invalid product status".to_owned())
            ),
            AppError::Database(_)
        ));
    }
}
