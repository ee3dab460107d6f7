//! Customer repository.
//!
//! Password hashes live in a separate `customer_passwords` table so that
//! customer reads never carry credential material.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use nixe_core::{CustomerId, Email, Locale, OrderId};

use super::{RepositoryError, map_unique_violation};
use crate::models::{Address, Customer};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    email: String,
    name: String,
    phone: Option<String>,
    preferred_language: String,
    addresses: Json<Vec<Address>>,
    billing_customer_id: Option<String>,
    order_ids: Vec<i32>,
    api_key: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let preferred_language = row.preferred_language.parse::<Locale>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid locale in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            email,
            name: row.name,
            phone: row.phone,
            preferred_language,
            addresses: row.addresses.0,
            billing_customer_id: row.billing_customer_id,
            order_ids: row.order_ids.into_iter().map(OrderId::new).collect(),
            api_key: row.api_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, email, name, phone, preferred_language, addresses, \
     billing_customer_id, order_ids, api_key, created_at, updated_at";

// =============================================================================
// Input Types
// =============================================================================

/// Fields for creating a customer account.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub preferred_language: Locale,
    pub addresses: Vec<Address>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a customer and its password hash in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already
    /// registered.
    pub async fn create(
        &self,
        new: &NewCustomer,
        password_hash: &str,
    ) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO customers (email, name, phone, preferred_language, addresses) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(new.email.as_str())
        .bind(&new.name)
        .bind(&new.phone)
        .bind(new.preferred_language.as_str())
        .bind(Json(&new.addresses))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "email already registered"))?;

        sqlx::query("INSERT INTO customer_passwords (customer_id, password_hash) VALUES ($1, $2)")
            .bind(row.id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no customer has this ID.
    pub async fn get(&self, id: CustomerId) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Get a customer by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no customer has this email.
    pub async fn get_by_email(&self, email: &Email) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Get a customer by API key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no customer has this key.
    pub async fn get_by_api_key(&self, api_key: Uuid) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers WHERE api_key = $1"
        ))
        .bind(api_key)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Get the password hash for a customer email, if the account exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(CustomerId, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, (i32, String)>(
            "SELECT c.id, p.password_hash \
             FROM customers c \
             JOIN customer_passwords p ON p.customer_id = c.id \
             WHERE c.email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, hash)| (CustomerId::new(id), hash)))
    }

    /// Persist the mutable profile fields of a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer no longer exists.
    pub async fn update(&self, customer: &Customer) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "UPDATE customers SET \
                 email = $2, name = $3, phone = $4, preferred_language = $5, \
                 addresses = $6, updated_at = now() \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(customer.id.as_i32())
        .bind(customer.email.as_str())
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.preferred_language.as_str())
        .bind(Json(&customer.addresses))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email already registered"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Persist the remote billing ID after the first customer sync.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer no longer exists.
    pub async fn set_billing_customer_id(
        &self,
        id: CustomerId,
        billing_customer_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customers SET billing_customer_id = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(billing_customer_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Append an order to the customer's back-reference list, skipping the
    /// append when the order is already present. Safe to run twice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer no longer exists.
    pub async fn append_order_id(
        &self,
        id: CustomerId,
        order_id: OrderId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customers SET \
                 order_ids = CASE \
                     WHEN order_ids @> ARRAY[$2::int] THEN order_ids \
                     ELSE array_append(order_ids, $2::int) \
                 END, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(order_id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
