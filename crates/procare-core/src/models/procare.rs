use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::deserialize_id;

/// A value from one of the Procare configuration option lists.
/// `name` falls back to `text` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawProcareOption")]
pub struct ProcareOption {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct RawProcareOption {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl From<RawProcareOption> for ProcareOption {
    fn from(raw: RawProcareOption) -> Self {
        Self {
            id: raw.id,
            name: raw.name.or(raw.text).unwrap_or_default(),
        }
    }
}

/// Option lists the Procare account supports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcareConfig {
    #[serde(default)]
    pub phone_number_types: Vec<ProcareOption>,
    #[serde(default)]
    pub relationship_types: Vec<ProcareOption>,
    #[serde(default)]
    pub enrollment_status_types: Vec<ProcareOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classroom {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl School {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), extra: Map::new() }
    }
}

impl Classroom {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), extra: Map::new() }
    }
}

impl Account {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), extra: Map::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_response() {
        let json = r#"{"phoneNumberTypes": [{"id": 1, "name": "Mobile"}], "relationshipTypes": [{"id": "M", "name": "Mother"}]}"#;
        let config: ProcareConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.phone_number_types, vec![ProcareOption { id: "1".into(), name: "Mobile".into() }]);
        assert_eq!(config.relationship_types[0].id, "M");
        assert!(config.enrollment_status_types.is_empty());
    }

    #[test]
    fn test_procare_option_prefers_name_over_text() {
        let option: ProcareOption = serde_json::from_str(r#"{"id": 2, "name": "Father", "text": "Dad"}"#).unwrap();
        assert_eq!(option.name, "Father");

        let option: ProcareOption = serde_json::from_str(r#"{"id": 3, "text": "Guardian"}"#).unwrap();
        assert_eq!(option, ProcareOption { id: "3".into(), name: "Guardian".into() });
    }

    #[test]
    fn test_classroom_keeps_extra_fields() {
        let json = r#"{"id": 12, "name": "Toddlers", "capacity": 8}"#;
        let room: Classroom = serde_json::from_str(json).unwrap();
        assert_eq!(room.id, "12");
        assert_eq!(room.name, "Toddlers");
        assert_eq!(room.extra.get("capacity"), Some(&Value::from(8)));
    }
}
