//! # apicalypse-core
//!
//! Build queries for APIs that speak the [Apicalypse](https://apicalypse.io/syntax/)
//! query language.
//!
//! Queries are assembled from [`FilterOption`] values. Each option validates
//! its arguments and writes one filter into a [`FilterSet`], which renders
//! itself as `name value; ` clauses ready to be sent as a request body or
//! appended to a URL.
//!
//! ```
//! use apicalypse_core::options::{fields, limit, where_clause};
//! use apicalypse_core::FilterSet;
//!
//! let filters = FilterSet::from_options([
//!     fields(["name", "rating"]),
//!     where_clause(["rating > 50"]),
//!     limit(10),
//! ])?;
//! assert!(filters.render().contains("limit 10; "));
//! # Ok::<(), apicalypse_core::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error type shared by query building and HTTP clients
//! - [`filter`] - Filter names, the filter set and rendering
//! - [`options`] - Option constructors, composition and application
//! - [`request`] - HTTP request construction
//! - [`config`] - API client configuration
//! - [`http`] - Transport settings and retry policy
//! - [`whitespace`] - Blank detection and whitespace stripping

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod options;
pub mod request;
pub mod whitespace;

// Re-export commonly used types
pub use config::ApicalypseConfig;
pub use error::{Error, Result};
pub use filter::{FilterName, FilterSet, OverlapPolicy};
pub use options::{apply_all, compose, FilterOption};
pub use request::{new_request, new_url_request, QueryMode};
