//! SQLite backend for the Docket row store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every committed write is re-published
//! on an in-process broadcast channel, which backs
//! [`DataService::subscribe`](docket_core::service::DataService::subscribe).

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
