//! Procare integration setup.
//!
//! Client-side support for connecting a business to the Procare
//! childcare-management provider:
//!
//! - `relations`: conversion between saved relation pairs and keyed form mappings
//! - `form`: the settings form model with import/export and deferred validation
//! - `cache`: per-parent caches for classroom and account lists
//! - `setup`: the setup screen state tying sources, caches and errors together
//! - `datasource`: business- or user-scoped integration storage
//! - `api`: the HTTP client implementing the `source` traits

pub mod api;
pub mod cache;
pub mod config;
pub mod datasource;
pub mod form;
pub mod models;
pub mod relations;
pub mod setup;
pub mod source;

pub use api::{ApiClient, ApiError};
pub use cache::ParentKeyedCache;
pub use config::Config;
pub use datasource::{IntegrationDataSource, StorageScope};
pub use form::{DefaultRules, FieldRules, FieldUpdate, FormField, SettingsFormModel};
pub use setup::{ErrorView, ProcareData, ProcareSetup};
pub use source::{IntegrationStore, LocalOptionsSource, ProcareSource};
