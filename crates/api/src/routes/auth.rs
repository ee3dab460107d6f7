//! Authentication routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::warn;

use nixe_core::Locale;

use crate::db::CustomerRepository;
use crate::error::{AppError, Result};
use crate::hooks;
use crate::middleware::{RequireCustomer, clear_current_customer, set_current_customer};
use crate::models::{Customer, CurrentCustomer};
use crate::routes::customers::CustomerView;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub preferred_language: Locale,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Run the customer sync hook and persist the remote ID. Failures are
/// logged and swallowed; the account exists either way.
pub(super) async fn sync_and_persist(state: &AppState, customer: &Customer) {
    let Some(provider) = state.billing() else {
        warn!(customer_id = %customer.id, "billing not configured, skipping customer sync");
        return;
    };

    match hooks::sync_customer(provider.as_ref(), customer).await {
        Ok(hooks::CustomerSyncOutcome::Created {
            billing_customer_id,
        }) => {
            let result = CustomerRepository::new(state.pool())
                .set_billing_customer_id(customer.id, &billing_customer_id)
                .await;
            if let Err(e) = result {
                warn!(customer_id = %customer.id, error = %e, "failed to persist billing customer ID");
            }
        }
        Ok(hooks::CustomerSyncOutcome::Updated) => {}
        Err(e) => {
            warn!(customer_id = %customer.id, error = %e, "customer billing sync failed");
        }
    }
}

/// Register a new customer and open a session.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<CustomerView>)> {
    let customer = AuthService::new(state.pool())
        .register(
            &request.email,
            &request.password,
            &request.name,
            request.preferred_language,
        )
        .await?;

    sync_and_persist(&state, &customer).await;

    let current = CurrentCustomer {
        id: customer.id,
        email: customer.email.clone(),
    };
    set_current_customer(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("failed to write session: {e}")))?;

    Ok((StatusCode::CREATED, Json(CustomerView::from(customer))))
}

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<CustomerView>> {
    let customer = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await?;

    let current = CurrentCustomer {
        id: customer.id,
        email: customer.email.clone(),
    };
    set_current_customer(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("failed to write session: {e}")))?;

    Ok(Json(CustomerView::from(customer)))
}

/// Logout the current session.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_customer(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// The current customer's profile.
pub async fn me(
    State(state): State<AppState>,
    RequireCustomer(current): RequireCustomer,
) -> Result<Json<CustomerView>> {
    let customer = CustomerRepository::new(state.pool()).get(current.id).await?;
    Ok(Json(CustomerView::from(customer)))
}
