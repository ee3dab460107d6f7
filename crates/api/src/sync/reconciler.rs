//! Background saga reconciler.
//!
//! Walks pending steps on an interval and applies their effects. The same
//! entry point ([`run_pending`]) is called inline right after checkout for
//! the first attempt, so a healthy system completes every step before the
//! interval ever fires.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::db::{CustomerRepository, OrderRepository, SyncStepRepository};
use crate::hooks;
use crate::state::AppState;

use super::{MAX_ATTEMPTS, SyncStep, SyncStepKind};

/// How often the background pass runs.
const RECONCILE_INTERVAL: Duration = Duration::from_secs(60);

/// Steps picked up per pass.
const BATCH_SIZE: i64 = 20;

/// Error applying a single step.
#[derive(Debug)]
struct StepError(String);

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<crate::db::RepositoryError> for StepError {
    fn from(e: crate::db::RepositoryError) -> Self {
        Self(e.to_string())
    }
}

impl From<crate::billing::BillingError> for StepError {
    fn from(e: crate::billing::BillingError) -> Self {
        Self(e.to_string())
    }
}

/// Spawn the background reconciliation loop.
pub fn spawn(state: AppState) {
    info!("spawning order sync reconciler");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RECONCILE_INTERVAL);
        // First tick fires immediately; skip it, checkout already ran the
        // inline attempt.
        interval.tick().await;
        loop {
            interval.tick().await;
            let processed = run_pending(&state).await;
            if processed > 0 {
                debug!(processed, "reconciler pass finished");
            }
        }
    });
}

/// Attempt every due step once. Returns the number of steps processed.
pub async fn run_pending(state: &AppState) -> usize {
    let steps = match SyncStepRepository::new(state.pool()).due(BATCH_SIZE).await {
        Ok(steps) => steps,
        Err(e) => {
            error!(error = %e, "failed to load pending sync steps");
            return 0;
        }
    };

    let mut processed = 0;
    for step in steps {
        process_step(state, &step).await;
        processed += 1;
    }
    processed
}

/// Apply one step and record the outcome.
async fn process_step(state: &AppState, step: &SyncStep) {
    let repo = SyncStepRepository::new(state.pool());

    match apply_step(state, step).await {
        Ok(()) => {
            if let Err(e) = repo.mark_completed(step.id).await {
                error!(step_id = %step.id, error = %e, "failed to mark sync step completed");
            }
        }
        Err(step_error) => {
            let exhausted = step.attempts + 1 >= MAX_ATTEMPTS;
            if exhausted {
                error!(
                    step_id = %step.id,
                    order_id = %step.order_id,
                    kind = %step.kind,
                    error = %step_error,
                    "sync step exhausted its retry budget"
                );
            } else {
                warn!(
                    step_id = %step.id,
                    order_id = %step.order_id,
                    kind = %step.kind,
                    attempt = step.attempts + 1,
                    error = %step_error,
                    "sync step attempt failed, will retry"
                );
            }
            if let Err(e) = repo.mark_attempt_failed(step.id, &step_error.to_string()).await {
                error!(step_id = %step.id, error = %e, "failed to record sync step failure");
            }
        }
    }
}

/// The effect behind each step kind.
async fn apply_step(state: &AppState, step: &SyncStep) -> Result<(), StepError> {
    let orders = OrderRepository::new(state.pool());
    let order = orders.get(step.order_id).await?;

    match step.kind {
        SyncStepKind::CustomerBackref => {
            CustomerRepository::new(state.pool())
                .append_order_id(order.customer_id, order.id)
                .await?;
            Ok(())
        }
        SyncStepKind::PaymentIntentCreate => {
            let Some(provider) = state.billing() else {
                return Err(StepError("billing not configured".to_owned()));
            };
            let customer = CustomerRepository::new(state.pool())
                .get(order.customer_id)
                .await?;

            if let Some(outcome) =
                hooks::create_payment_intent(provider.as_ref(), &order, &customer).await?
            {
                orders
                    .set_payment_intent(
                        order.id,
                        &outcome.intent_id,
                        outcome.client_secret.as_deref(),
                    )
                    .await?;
            }
            Ok(())
        }
        SyncStepKind::PaymentIntentAmount => {
            let Some(provider) = state.billing() else {
                return Err(StepError("billing not configured".to_owned()));
            };
            hooks::push_payment_intent_amount(provider.as_ref(), &order).await?;
            Ok(())
        }
    }
}
