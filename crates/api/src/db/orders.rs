//! Order repository.
//!
//! Items and address snapshots are JSONB; they are frozen at purchase time
//! and never re-joined against the catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use nixe_core::{CustomerId, OrderId, OrderNumber, OrderStatus, OrderTotals};

use super::{RepositoryError, map_unique_violation};
use crate::models::{AddressSnapshot, Order, OrderItem};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    customer_id: i32,
    items: Json<Vec<OrderItem>>,
    status: String,
    shipping_address: Json<AddressSnapshot>,
    billing_address: Json<AddressSnapshot>,
    subtotal: Decimal,
    tax: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    billing_payment_intent_id: Option<String>,
    client_secret: Option<String>,
    payment_error: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order_number = OrderNumber::parse(&row.order_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order number in database: {e}"))
        })?;
        let status = row.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            order_number,
            customer_id: CustomerId::new(row.customer_id),
            items: row.items.0,
            status,
            shipping_address: row.shipping_address.0,
            billing_address: row.billing_address.0,
            subtotal: row.subtotal,
            tax: row.tax,
            shipping_cost: row.shipping_cost,
            total: row.total,
            billing_payment_intent_id: row.billing_payment_intent_id,
            client_secret: row.client_secret,
            payment_error: row.payment_error,
            paid_at: row.paid_at,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, order_number, customer_id, items, status, shipping_address, \
     billing_address, subtotal, tax, shipping_cost, total, \
     billing_payment_intent_id, client_secret, payment_error, paid_at, notes, \
     created_at, updated_at";

// =============================================================================
// Input Types
// =============================================================================

/// Fields for creating an order. Totals are computed by the caller before
/// the insert; the repository never does money math.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub totals: OrderTotals,
    pub shipping_cost: Decimal,
    pub notes: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order.
    ///
    /// Order numbers are not guaranteed globally unique by construction; a
    /// rare collision surfaces here as `RepositoryError::Conflict` and the
    /// client retries the checkout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on an order-number collision.
    pub async fn create(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders \
                 (order_number, customer_id, items, status, shipping_address, \
                  billing_address, subtotal, tax, shipping_cost, total, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(new.order_number.as_str())
        .bind(new.customer_id.as_i32())
        .bind(Json(&new.items))
        .bind(new.status.as_str())
        .bind(Json(&new.shipping_address))
        .bind(Json(&new.billing_address))
        .bind(new.totals.subtotal)
        .bind(new.totals.tax)
        .bind(new.shipping_cost)
        .bind(new.totals.total)
        .bind(&new.notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "order number collision"))?;

        row.try_into()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn get(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// List a customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders \
             WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Persist the mutable fields of an order after an update. The order
    /// number is never rewritten.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order no longer exists.
    pub async fn update(&self, order: &Order) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET \
                 items = $2, status = $3, shipping_address = $4, \
                 billing_address = $5, subtotal = $6, tax = $7, \
                 shipping_cost = $8, total = $9, notes = $10, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(order.id.as_i32())
        .bind(Json(&order.items))
        .bind(order.status.as_str())
        .bind(Json(&order.shipping_address))
        .bind(Json(&order.billing_address))
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.shipping_cost)
        .bind(order.total)
        .bind(&order.notes)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Persist the payment-intent reference after creation at the provider.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order no longer exists.
    pub async fn set_payment_intent(
        &self,
        id: OrderId,
        intent_id: &str,
        client_secret: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET \
                 billing_payment_intent_id = $2, client_secret = $3, \
                 status = $4, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(intent_id)
        .bind(client_secret)
        .bind(OrderStatus::AwaitingPayment.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark an order paid. A pure overwrite, so webhook redelivery is
    /// harmless.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order no longer exists.
    pub async fn mark_paid(&self, id: OrderId, paid_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET \
                 status = $2, paid_at = $3, payment_error = NULL, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(OrderStatus::Paid.as_str())
        .bind(paid_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a payment failure. A pure overwrite, like [`Self::mark_paid`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order no longer exists.
    pub async fn mark_payment_failed(
        &self,
        id: OrderId,
        message: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET \
                 status = $2, payment_error = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(OrderStatus::Failed.as_str())
        .bind(message)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
