//! Option sets sourced from the local business system.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::deserialize_id;

/// A selectable local value (child status, location, custom field choice).
///
/// The display text is read from `text`, falling back to `name` and then
/// `value` when the payload has no `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOptionItem")]
pub struct OptionItem {
    pub id: String,
    pub text: String,
}

#[derive(Deserialize)]
struct RawOptionItem {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<Value>,
}

impl From<RawOptionItem> for OptionItem {
    fn from(raw: RawOptionItem) -> Self {
        let value = raw.value.and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        Self {
            id: raw.id,
            text: raw.text.or(raw.name).or(value).unwrap_or_default(),
        }
    }
}

impl OptionItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// System names of the custom data fields the setup cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFieldName {
    Relationship,
    Gender,
}

impl DataFieldName {
    pub fn system_name(&self) -> &'static str {
        match self {
            DataFieldName::Relationship => "relationship",
            DataFieldName::Gender => "gender",
        }
    }
}

/// A business custom data field and its selectable values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataField {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub input_values: Option<Vec<OptionItem>>,
}

impl DataField {
    /// Values of the first field matching `name`, or an empty list.
    pub fn find_values(fields: &[DataField], name: DataFieldName) -> Vec<OptionItem> {
        fields
            .iter()
            .find(|f| f.system_name.as_deref() == Some(name.system_name()))
            .and_then(|f| f.input_values.clone())
            .unwrap_or_default()
    }
}

/// Local option sets that drive which mappings the form materializes.
/// `None` means the set was never loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalOptionSets {
    pub child_statuses: Option<Vec<OptionItem>>,
    pub relationships: Option<Vec<OptionItem>>,
    pub locations: Option<Vec<OptionItem>>,
    pub genders: Option<Vec<OptionItem>>,
}

impl LocalOptionSets {
    pub(crate) fn has(set: &Option<Vec<OptionItem>>) -> bool {
        set.as_ref().map(|s| !s.is_empty()).unwrap_or(false)
    }
}
