//! HTTP access to the business API.
//!
//! This module provides the `ApiClient`, which implements the source traits
//! from `crate::source` over the business API's REST endpoints: Procare
//! resource lookups, local option sets and integration storage.
//!
//! Requests carry an optional bearer token; obtaining it is the host
//! application's job.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
