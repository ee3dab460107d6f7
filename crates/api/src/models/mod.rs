//! Domain types.
//!
//! These are validated typed records, separate from database row types and
//! request payloads. Hooks and routes only ever see these - never loose
//! JSON bags.

pub mod category;
pub mod customer;
pub mod order;
pub mod product;
pub mod session;

pub use category::Category;
pub use customer::{Address, Customer, append_order_once};
pub use order::{AddressSnapshot, Order, OrderItem, compute_item_totals};
pub use product::{Product, Specification};
pub use session::{CurrentCustomer, session_keys};
