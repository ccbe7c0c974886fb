//! Async client for APIs that speak the Apicalypse query language.
//!
//! Queries are built from [`apicalypse_core`] filter options and sent with
//! retries. [`Paginator`] walks large result sets with `limit`/`offset`.

#![deny(missing_docs)]

pub mod client;
pub mod paginator;

pub use client::{ApicalypseClient, ApicalypseClientBuilder, QueryExecutor};
pub use paginator::Paginator;

/// Convenient result alias that reuses the core error type.
pub type Result<T> = apicalypse_core::Result<T>;
