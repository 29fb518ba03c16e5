//! # KIS Token Agent Library
//!
//! Bearer-token lifecycle manager for the KIS open trading API: exchanges
//! application credentials for an OAuth access token, persists every
//! issuance to an append-only credential store, publishes the current value
//! to a shared in-memory holder, and renews it from a background scheduler.
//!
//! Modules:
//! - `config` — YAML service settings and environment credentials
//! - `store` — durable append-only credential store
//! - `issuer` — credentials-for-token network exchange
//! - `cache` — shared active-token holder read by API clients
//! - `manager` — the reuse-vs-reissue refresh decision
//! - `scheduler` — periodic renewal loop with clean shutdown

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod issuer;
pub mod manager;
pub mod observability;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod tests;
pub mod utils;

pub use crate::config::types::ServiceConfig;
pub use crate::error::{Error, IssuanceError, PersistenceError};
