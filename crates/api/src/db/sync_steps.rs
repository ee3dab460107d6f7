//! Saga step repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use nixe_core::{OrderId, SyncStepId};

use super::RepositoryError;
use crate::sync::{MAX_ATTEMPTS, SyncStep, SyncStepKind, SyncStepStatus};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SyncStepRow {
    id: i32,
    order_id: i32,
    kind: String,
    status: String,
    attempts: i32,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SyncStepRow> for SyncStep {
    type Error = RepositoryError;

    fn try_from(row: SyncStepRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse::<SyncStepKind>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid sync step kind in database: {e}"))
        })?;
        let status = row.status.parse::<SyncStepStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid sync step status in database: {e}"))
        })?;

        Ok(Self {
            id: SyncStepId::new(row.id),
            order_id: OrderId::new(row.order_id),
            kind,
            status,
            attempts: row.attempts,
            last_error: row.last_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, order_id, kind, status, attempts, last_error, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for saga step database operations.
pub struct SyncStepRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SyncStepRepository<'a> {
    /// Create a new saga step repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a step for an order. Re-enqueueing an existing (order, kind)
    /// pair re-arms it: status back to pending with a fresh retry budget.
    /// The step effects are idempotent, so re-running a completed step is
    /// safe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn enqueue(
        &self,
        order_id: OrderId,
        kind: SyncStepKind,
    ) -> Result<SyncStep, RepositoryError> {
        let row = sqlx::query_as::<_, SyncStepRow>(&format!(
            "INSERT INTO order_sync_steps (order_id, kind) \
             VALUES ($1, $2) \
             ON CONFLICT (order_id, kind) DO UPDATE SET \
                 status = 'pending', attempts = 0, last_error = NULL, \
                 updated_at = now() \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(order_id.as_i32())
        .bind(kind.as_str())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Pending steps with retry budget left, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn due(&self, limit: i64) -> Result<Vec<SyncStep>, RepositoryError> {
        let rows = sqlx::query_as::<_, SyncStepRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM order_sync_steps \
             WHERE status = 'pending' AND attempts < $1 \
             ORDER BY created_at \
             LIMIT $2"
        ))
        .bind(MAX_ATTEMPTS)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Mark a step completed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the step no longer exists.
    pub async fn mark_completed(&self, id: SyncStepId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE order_sync_steps SET \
                 status = 'completed', last_error = NULL, \
                 attempts = attempts + 1, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a failed attempt. The step stays `pending` until the retry
    /// budget is exhausted, then flips to `failed`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the step no longer exists.
    pub async fn mark_attempt_failed(
        &self,
        id: SyncStepId,
        error: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE order_sync_steps SET \
                 attempts = attempts + 1, \
                 last_error = $2, \
                 status = CASE WHEN attempts + 1 >= $3 THEN 'failed' ELSE 'pending' END, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(error)
        .bind(MAX_ATTEMPTS)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
