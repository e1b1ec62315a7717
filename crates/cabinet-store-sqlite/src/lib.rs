//! SQLite backend for the Cabinet catalog store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. One database file per tenant
//! grouping (see [`TenantLayout`]) keeps namespaces physically isolated.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod layout;

pub use error::{Error, Result};
pub use layout::TenantLayout;
pub use store::SqliteCatalogStore;
