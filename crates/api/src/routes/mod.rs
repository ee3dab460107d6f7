//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (database ping)
//!
//! # Catalog (public read, authenticated write)
//! GET  /api/categories              - Category listing
//! GET  /api/categories/{id}         - Category detail
//! POST /api/categories              - Create category
//! PATCH /api/categories/{id}        - Update category
//! GET  /api/products                - Product listing (drafts hidden)
//! GET  /api/products/{id}           - Product detail
//! POST /api/products                - Create product (billing sync hook)
//! PATCH /api/products/{id}          - Update product (price rotation)
//!
//! # Auth
//! POST /api/auth/register           - Register (session + customer sync)
//! POST /api/auth/login              - Login
//! POST /api/auth/logout             - Logout
//! GET  /api/auth/me                 - Current customer
//!
//! # Customers (self only)
//! GET  /api/customers/{id}          - Customer detail
//! PATCH /api/customers/{id}         - Update profile/addresses
//!
//! # Orders (open checkout, owner-scoped reads)
//! POST /api/orders                  - Checkout (guests name the customer)
//! GET  /api/orders                  - Own order history
//! GET  /api/orders/{id}             - Order detail
//! PATCH /api/orders/{id}            - Status transition / item update
//!
//! # Webhooks
//! POST /api/webhooks/billing        - Signed billing provider events
//! ```
//!
//! Localized fields resolve via `?locale=fr|en` (default `fr`, fallback
//! `fr` when an English value is missing).

pub mod auth;
pub mod categories;
pub mod customers;
pub mod health;
pub mod orders;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route("/{id}", get(categories::show).patch(categories::update))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/{id}", get(products::show).patch(products::update))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(customers::show).patch(customers::update))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::show).patch(orders::update))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/auth", auth_routes())
        .nest("/customers", customer_routes())
        .nest("/orders", order_routes())
        .route("/webhooks/billing", post(webhooks::billing));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/api", api)
}
