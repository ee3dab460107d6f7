//! Nixe API library.
//!
//! The storefront backend as a library, so integration tests can exercise
//! routes, hooks and repositories directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod billing;
pub mod config;
pub mod db;
pub mod error;
pub mod hooks;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod sync;
