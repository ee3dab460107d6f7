//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use url::Url;

use crate::billing::{BillingProvider, StripeClient, WebhookVerifier};
use crate::config::ApiConfig;

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid NIXE_PUBLIC_URL: {0}")]
    InvalidPublicUrl(#[from] url::ParseError),
    #[error("billing client error: {0}")]
    Billing(#[from] crate::billing::BillingError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The billing provider is constructed once
/// here and injected; handlers and hooks only ever see the trait object.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    billing: Option<Arc<dyn BillingProvider>>,
    public_base: Url,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Builds the billing client when a secret key is configured; without
    /// one, every sync hook is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the public URL is invalid or the billing client
    /// fails to build.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let public_base = Url::parse(&config.public_url)?;

        let billing: Option<Arc<dyn BillingProvider>> = match &config.billing {
            Some(billing_config) => Some(Arc::new(StripeClient::new(billing_config)?)),
            None => None,
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                billing,
                public_base,
            }),
        })
    }

    /// Create a state with an explicit billing provider, for tests.
    #[must_use]
    pub fn with_billing(
        config: ApiConfig,
        pool: PgPool,
        billing: Arc<dyn BillingProvider>,
        public_base: Url,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                billing: Some(billing),
                public_base,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the billing provider, if billing is configured.
    #[must_use]
    pub fn billing(&self) -> Option<&Arc<dyn BillingProvider>> {
        self.inner.billing.as_ref()
    }

    /// The public storefront base URL (absolute image URL construction).
    #[must_use]
    pub fn public_base(&self) -> &Url {
        &self.inner.public_base
    }

    /// Build a webhook verifier, when a webhook secret is configured.
    #[must_use]
    pub fn webhook_verifier(&self) -> Option<WebhookVerifier> {
        self.inner
            .config
            .billing
            .as_ref()
            .and_then(|b| b.webhook_secret.clone())
            .map(WebhookVerifier::new)
    }
}
