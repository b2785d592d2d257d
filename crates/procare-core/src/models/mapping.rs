use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::deserialize_id;

/// Local identifier to Procare identifier. A `None` value means the local
/// option has not been assigned a provider counterpart yet.
pub type KeyedMapping = BTreeMap<String, Option<String>>;

/// A single local/provider pair as stored by the business API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct RelationEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub local: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub procare: String,
}

impl RelationEntry {
    pub fn new(local: impl Into<String>, procare: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            procare: procare.into(),
        }
    }
}
