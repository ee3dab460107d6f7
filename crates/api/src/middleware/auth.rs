//! Authentication extractors.
//!
//! Two credentials are accepted: the session cookie set by login, and a
//! per-customer API key carried as `Authorization: customers API-Key <uuid>`.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::db::CustomerRepository;
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;

/// Authorization scheme prefix for API-key requests.
const API_KEY_SCHEME: &str = "customers API-Key ";

/// Extractor that requires an authenticated customer.
pub struct RequireCustomer(pub CurrentCustomer);

/// Rejection for unauthenticated requests.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({"error": "Authentication required"})),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match current_customer(parts, state).await {
            Some(customer) => Ok(Self(customer)),
            None => Err(AuthRejection),
        }
    }
}

/// Extractor that optionally resolves the current customer.
pub struct OptionalCustomer(pub Option<CurrentCustomer>);

impl FromRequestParts<AppState> for OptionalCustomer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(current_customer(parts, state).await))
    }
}

/// Resolve the caller: session first, API-key header second.
async fn current_customer(parts: &Parts, state: &AppState) -> Option<CurrentCustomer> {
    if let Some(session) = parts.extensions.get::<Session>() {
        if let Ok(Some(customer)) = session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await
        {
            return Some(customer);
        }
    }

    let api_key = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(API_KEY_SCHEME))
        .and_then(|key| key.trim().parse::<Uuid>().ok())?;

    let customer = CustomerRepository::new(state.pool())
        .get_by_api_key(api_key)
        .await
        .ok()?;

    Some(CurrentCustomer {
        id: customer.id,
        email: customer.email,
    })
}

/// Set the current customer in the session after login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Clear the current customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    Ok(())
}
