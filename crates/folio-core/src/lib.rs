//! Core types and trait definitions for the Folio wiki.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the page/revision data model, the checkout guards every backend must run
//! before committing a write, and the diff engine used by comparisons.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod comparison;
pub mod diff;
pub mod error;
pub mod page;
pub mod revision;
pub mod store;
pub mod user;

pub use error::{Error, ErrorKind, Result};
