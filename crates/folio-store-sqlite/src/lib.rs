//! SQLite backend for the Folio wiki.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write runs inside an `IMMEDIATE`
//! transaction, which takes SQLite's write lock up front: a check-then-write
//! sequence inside one transaction cannot interleave with another writer.

mod comparisons;
mod encode;
mod pages;
mod revisions;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
