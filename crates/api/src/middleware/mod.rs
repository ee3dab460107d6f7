//! HTTP middleware and extractors.

pub mod auth;
pub mod locale;
pub mod session;

pub use auth::{OptionalCustomer, RequireCustomer, clear_current_customer, set_current_customer};
pub use locale::ClientLocale;
pub use session::create_session_layer;
