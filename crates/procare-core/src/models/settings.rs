//! Integration settings in their three shapes: the saved remote record,
//! the local form, and the payload sent back on submit.

use serde::{Deserialize, Serialize};

use super::{deserialize_optional_id, deserialize_optional_ids, KeyedMapping, RelationEntry};

/// Settings stored for a Procare integration. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcareSettings {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub ikn: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub phone_type_id: Option<String>,
    #[serde(default)]
    pub sync_time: Option<String>,
    #[serde(default)]
    pub marketing_automation_enabled: Option<bool>,
    #[serde(default)]
    pub sync_immediately_enabled: Option<bool>,
    #[serde(default)]
    pub marketing_automation_during_instant_sync_enabled: Option<bool>,
    #[serde(default)]
    pub future_enrollments_enabled: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_ids")]
    pub allowed_relationships: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_ids")]
    pub child_enrollment_statuses: Option<Vec<String>>,
}

/// Saved local/provider pairs, one list per mapping kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedMapping {
    #[serde(default)]
    pub child_statuses: Option<Vec<RelationEntry>>,
    #[serde(default)]
    pub relationships: Option<Vec<RelationEntry>>,
    #[serde(default)]
    pub locations: Option<Vec<RelationEntry>>,
}

/// A saved Procare integration as returned by the business API.
/// Both parts are absent when the integration is being created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcareItemResponse {
    #[serde(default)]
    pub settings: Option<ProcareSettings>,
    #[serde(default)]
    pub mapping: Option<SavedMapping>,
}

/// Flat form record edited by the setup screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SettingsForm {
    pub ikn: String,
    pub consent: bool,
    pub phone_type_id: Option<String>,
    pub sync_time: String,
    pub marketing_automation_enabled: bool,
    pub sync_immediately_enabled: bool,
    pub marketing_automation_during_instant_sync_enabled: bool,
    pub future_enrollments_enabled: bool,
    pub statuses: KeyedMapping,
    pub relationships: KeyedMapping,
    pub locations: KeyedMapping,
    pub genders: KeyedMapping,
    pub allowed_relationships: Vec<String>,
    pub child_enrollment_statuses: Vec<String>,
}

/// Payload submitted to store the integration settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ProcareRequest {
    pub ikn: String,
    pub consent: bool,
    pub phone_type_id: Option<String>,
    pub sync_time: String,
    pub marketing_automation_enabled: bool,
    pub sync_immediately_enabled: bool,
    pub marketing_automation_during_instant_sync_enabled: bool,
    pub future_enrollments_enabled: bool,
    pub statuses: Vec<RelationEntry>,
    pub relationships: Vec<RelationEntry>,
    pub locations: Vec<RelationEntry>,
    /// Sent as the keyed form value, not as pairs.
    pub genders: KeyedMapping,
    pub allowed_relationships: Vec<String>,
    pub child_enrollment_statuses: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_saved_integration() {
        let json = r#"{
            "settings": {"ikn": 12345, "phone_type_id": 2, "sync_time": "06:30",
                         "sync_immediately_enabled": true, "allowed_relationships": [1, "2"]},
            "mapping": {"child_statuses": [{"local": 7, "procare": "active"}]}
        }"#;
        let resp: ProcareItemResponse = serde_json::from_str(json).unwrap();
        let settings = resp.settings.unwrap();
        assert_eq!(settings.ikn.as_deref(), Some("12345"));
        assert_eq!(settings.phone_type_id.as_deref(), Some("2"));
        assert_eq!(settings.sync_immediately_enabled, Some(true));
        assert_eq!(settings.marketing_automation_enabled, None);
        assert_eq!(settings.allowed_relationships, Some(vec!["1".to_string(), "2".to_string()]));

        let mapping = resp.mapping.unwrap();
        assert_eq!(mapping.child_statuses, Some(vec![RelationEntry::new("7", "active")]));
        assert_eq!(mapping.locations, None);
    }

    #[test]
    fn test_parse_new_integration() {
        let resp: ProcareItemResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.settings.is_none());
        assert!(resp.mapping.is_none());
    }

    #[test]
    fn test_settings_form_default_is_blank() {
        let form = SettingsForm::default();
        assert_eq!(form.ikn, "");
        assert!(!form.consent);
        assert_eq!(form.phone_type_id, None);
        assert!(form.statuses.is_empty() && form.genders.is_empty());
    }
}
