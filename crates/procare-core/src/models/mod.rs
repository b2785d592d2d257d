//! Data models for the Procare integration setup.
//!
//! This module contains the structures exchanged with the business API and
//! the Procare provider, plus the local form representation:
//!
//! - `RelationEntry`, `KeyedMapping`: local/provider identifier pairs
//! - `SettingsForm`, `ProcareItemResponse`, `ProcareRequest`: integration settings
//! - `ProcareConfig`, `School`, `Classroom`, `Account`: provider resources
//! - `OptionItem`, `DataField`, `LocalOptionSets`: local option sets
//! - `IntegrationOption`: a connected third-party integration

pub mod integration;
pub mod mapping;
pub mod options;
pub mod procare;
pub mod settings;

pub use integration::IntegrationOption;
pub use mapping::{KeyedMapping, RelationEntry};
pub use options::{DataField, DataFieldName, LocalOptionSets, OptionItem};
pub use procare::{Account, Classroom, ProcareConfig, ProcareOption, School};
pub use settings::{ProcareItemResponse, ProcareRequest, ProcareSettings, SavedMapping, SettingsForm};

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// Response wrapper used by every business API endpoint: `{ "data": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Identifiers arrive as either JSON strings or numbers; keep them as strings.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected string or number id, got {}", other))),
    }
}

pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected string or number id, got {}", other))),
    }
}

pub(crate) fn deserialize_optional_ids<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(values) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    values
        .into_iter()
        .map(|v| match v {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(de::Error::custom(format!("expected string or number id, got {}", other))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
