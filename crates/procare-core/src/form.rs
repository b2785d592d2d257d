//! Settings form state for the Procare integration screen.
//!
//! `SettingsFormModel` holds the flat form record, per-field validation
//! errors and a queue of validations deferred to the next update cycle.
//! It converts saved integrations into form values and form values into the
//! submit payload.

use std::collections::{BTreeMap, VecDeque};

use chrono::NaiveTime;
use tracing::debug;

use crate::models::{
    KeyedMapping, LocalOptionSets, ProcareItemResponse, ProcareRequest, SettingsForm,
};
use crate::relations::{map_genders, to_entry_sequence, to_keyed_mapping};

/// Format accepted for the daily sync time.
const SYNC_TIME_FORMAT: &str = "%H:%M";

/// Identifies one field of `SettingsForm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Ikn,
    Consent,
    PhoneTypeId,
    SyncTime,
    MarketingAutomationEnabled,
    SyncImmediatelyEnabled,
    MarketingAutomationDuringInstantSyncEnabled,
    FutureEnrollmentsEnabled,
    Statuses,
    Relationships,
    Locations,
    Genders,
    AllowedRelationships,
    ChildEnrollmentStatuses,
}

impl FormField {
    pub const ALL: [FormField; 14] = [
        FormField::Ikn,
        FormField::Consent,
        FormField::PhoneTypeId,
        FormField::SyncTime,
        FormField::MarketingAutomationEnabled,
        FormField::SyncImmediatelyEnabled,
        FormField::MarketingAutomationDuringInstantSyncEnabled,
        FormField::FutureEnrollmentsEnabled,
        FormField::Statuses,
        FormField::Relationships,
        FormField::Locations,
        FormField::Genders,
        FormField::AllowedRelationships,
        FormField::ChildEnrollmentStatuses,
    ];

    /// Wire name of the field, as used in payloads and server error keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Ikn => "ikn",
            FormField::Consent => "consent",
            FormField::PhoneTypeId => "phone_type_id",
            FormField::SyncTime => "sync_time",
            FormField::MarketingAutomationEnabled => "marketing_automation_enabled",
            FormField::SyncImmediatelyEnabled => "sync_immediately_enabled",
            FormField::MarketingAutomationDuringInstantSyncEnabled => {
                "marketing_automation_during_instant_sync_enabled"
            }
            FormField::FutureEnrollmentsEnabled => "future_enrollments_enabled",
            FormField::Statuses => "statuses",
            FormField::Relationships => "relationships",
            FormField::Locations => "locations",
            FormField::Genders => "genders",
            FormField::AllowedRelationships => "allowed_relationships",
            FormField::ChildEnrollmentStatuses => "child_enrollment_statuses",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

/// A new value for one form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Ikn(String),
    Consent(bool),
    PhoneTypeId(Option<String>),
    SyncTime(String),
    MarketingAutomationEnabled(bool),
    SyncImmediatelyEnabled(bool),
    MarketingAutomationDuringInstantSyncEnabled(bool),
    FutureEnrollmentsEnabled(bool),
    Statuses(KeyedMapping),
    Relationships(KeyedMapping),
    Locations(KeyedMapping),
    Genders(KeyedMapping),
    AllowedRelationships(Vec<String>),
    ChildEnrollmentStatuses(Vec<String>),
}

impl FieldUpdate {
    pub fn field(&self) -> FormField {
        match self {
            FieldUpdate::Ikn(_) => FormField::Ikn,
            FieldUpdate::Consent(_) => FormField::Consent,
            FieldUpdate::PhoneTypeId(_) => FormField::PhoneTypeId,
            FieldUpdate::SyncTime(_) => FormField::SyncTime,
            FieldUpdate::MarketingAutomationEnabled(_) => FormField::MarketingAutomationEnabled,
            FieldUpdate::SyncImmediatelyEnabled(_) => FormField::SyncImmediatelyEnabled,
            FieldUpdate::MarketingAutomationDuringInstantSyncEnabled(_) => {
                FormField::MarketingAutomationDuringInstantSyncEnabled
            }
            FieldUpdate::FutureEnrollmentsEnabled(_) => FormField::FutureEnrollmentsEnabled,
            FieldUpdate::Statuses(_) => FormField::Statuses,
            FieldUpdate::Relationships(_) => FormField::Relationships,
            FieldUpdate::Locations(_) => FormField::Locations,
            FieldUpdate::Genders(_) => FormField::Genders,
            FieldUpdate::AllowedRelationships(_) => FormField::AllowedRelationships,
            FieldUpdate::ChildEnrollmentStatuses(_) => FormField::ChildEnrollmentStatuses,
        }
    }

    fn apply(self, form: &mut SettingsForm) {
        match self {
            FieldUpdate::Ikn(v) => form.ikn = v,
            FieldUpdate::Consent(v) => form.consent = v,
            FieldUpdate::PhoneTypeId(v) => form.phone_type_id = v,
            FieldUpdate::SyncTime(v) => form.sync_time = v,
            FieldUpdate::MarketingAutomationEnabled(v) => form.marketing_automation_enabled = v,
            FieldUpdate::SyncImmediatelyEnabled(v) => form.sync_immediately_enabled = v,
            FieldUpdate::MarketingAutomationDuringInstantSyncEnabled(v) => {
                form.marketing_automation_during_instant_sync_enabled = v
            }
            FieldUpdate::FutureEnrollmentsEnabled(v) => form.future_enrollments_enabled = v,
            FieldUpdate::Statuses(v) => form.statuses = v,
            FieldUpdate::Relationships(v) => form.relationships = v,
            FieldUpdate::Locations(v) => form.locations = v,
            FieldUpdate::Genders(v) => form.genders = v,
            FieldUpdate::AllowedRelationships(v) => form.allowed_relationships = v,
            FieldUpdate::ChildEnrollmentStatuses(v) => form.child_enrollment_statuses = v,
        }
    }
}

/// Validation rules for individual form fields.
pub trait FieldRules {
    /// Error message for `field` given the current form, or `None` if valid.
    fn check(&self, field: FormField, form: &SettingsForm) -> Option<String>;
}

/// Client-side checks applied before the server sees the form.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRules;

impl FieldRules for DefaultRules {
    fn check(&self, field: FormField, form: &SettingsForm) -> Option<String> {
        match field {
            FormField::Ikn if form.ikn.trim().is_empty() => Some("IKN is required".to_string()),
            FormField::Consent if !form.consent => Some("Consent is required".to_string()),
            FormField::SyncTime
                if !form.sync_time.is_empty()
                    && NaiveTime::parse_from_str(&form.sync_time, SYNC_TIME_FORMAT).is_err() =>
            {
                Some("Sync time must be in HH:MM format".to_string())
            }
            _ => None,
        }
    }
}

/// Build form values from a saved integration.
///
/// Scalar fields fall back to their blank defaults when missing. The status,
/// relationship and location mappings are only materialized when the matching
/// local option set is loaded and non-empty. Consent is only ever returned by
/// way of an existing integration, so it is set whenever settings exist.
pub fn import_settings(edit: &ProcareItemResponse, options: &LocalOptionSets) -> SettingsForm {
    let mut values = SettingsForm::default();

    if let Some(ref settings) = edit.settings {
        values.consent = true;
        values.ikn = settings.ikn.clone().unwrap_or_default();
        values.phone_type_id = settings.phone_type_id.clone().filter(|p| !p.is_empty());
        values.sync_time = settings.sync_time.clone().unwrap_or_default();
        values.marketing_automation_enabled = settings.marketing_automation_enabled.unwrap_or(false);
        values.sync_immediately_enabled = settings.sync_immediately_enabled.unwrap_or(false);
        values.marketing_automation_during_instant_sync_enabled = settings
            .marketing_automation_during_instant_sync_enabled
            .unwrap_or(false);
        values.future_enrollments_enabled = settings.future_enrollments_enabled.unwrap_or(false);
        values.allowed_relationships = settings.allowed_relationships.clone().unwrap_or_default();
        values.child_enrollment_statuses = settings.child_enrollment_statuses.clone().unwrap_or_default();
    }

    let saved = edit.mapping.as_ref();

    if LocalOptionSets::has(&options.child_statuses) {
        values.statuses = to_keyed_mapping(saved.and_then(|m| m.child_statuses.as_deref()));
    }
    if LocalOptionSets::has(&options.relationships) {
        values.relationships = to_keyed_mapping(saved.and_then(|m| m.relationships.as_deref()));
    }
    if LocalOptionSets::has(&options.locations) {
        values.locations = to_keyed_mapping(saved.and_then(|m| m.locations.as_deref()));
    }

    // Gender values are not saved remotely yet; derive them from option text.
    if let Some(ref genders) = options.genders {
        values.genders = map_genders(genders);
    }

    values
}

/// Build the submit payload from form values.
pub fn export_settings(values: &SettingsForm) -> ProcareRequest {
    ProcareRequest {
        ikn: values.ikn.clone(),
        consent: values.consent,
        phone_type_id: values.phone_type_id.clone(),
        sync_time: values.sync_time.clone(),
        marketing_automation_enabled: values.marketing_automation_enabled,
        sync_immediately_enabled: values.sync_immediately_enabled,
        marketing_automation_during_instant_sync_enabled: values
            .marketing_automation_during_instant_sync_enabled,
        future_enrollments_enabled: values.future_enrollments_enabled,
        statuses: to_entry_sequence(&values.statuses),
        relationships: to_entry_sequence(&values.relationships),
        locations: to_entry_sequence(&values.locations),
        genders: values.genders.clone(),
        allowed_relationships: values.allowed_relationships.clone(),
        child_enrollment_statuses: values.child_enrollment_statuses.clone(),
    }
}

pub struct SettingsFormModel<R = DefaultRules> {
    values: SettingsForm,
    errors: BTreeMap<FormField, String>,
    pending: VecDeque<FormField>,
    rules: R,
}

impl SettingsFormModel<DefaultRules> {
    pub fn new() -> Self {
        Self::with_rules(DefaultRules)
    }
}

impl Default for SettingsFormModel<DefaultRules> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: FieldRules> SettingsFormModel<R> {
    pub fn with_rules(rules: R) -> Self {
        Self {
            values: SettingsForm::default(),
            errors: BTreeMap::new(),
            pending: VecDeque::new(),
            rules,
        }
    }

    pub fn values(&self) -> &SettingsForm {
        &self.values
    }

    pub fn errors(&self) -> &BTreeMap<FormField, String> {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Convert a saved integration into form values. Does not touch the
    /// current state; apply the result with `set_values`.
    pub fn import_data(&self, edit: &ProcareItemResponse, options: &LocalOptionSets) -> SettingsForm {
        let values = import_settings(edit, options);
        debug!(
            consent = values.consent,
            statuses = values.statuses.len(),
            relationships = values.relationships.len(),
            locations = values.locations.len(),
            genders = values.genders.len(),
            "Imported Procare settings"
        );
        values
    }

    pub fn export_data(&self) -> ProcareRequest {
        export_settings(&self.values)
    }

    /// Replace every value, keeping current errors.
    pub fn set_values(&mut self, values: SettingsForm) {
        self.values = values;
    }

    /// Blank the form and drop errors and queued validations.
    pub fn reset(&mut self) {
        self.values = SettingsForm::default();
        self.errors.clear();
        self.pending.clear();
    }

    pub fn set_field(&mut self, update: FieldUpdate) {
        update.apply(&mut self.values);
    }

    /// Set one field now and validate just that field on the next `tick`.
    pub fn set_field_and_validate(&mut self, update: FieldUpdate) {
        let field = update.field();
        self.set_field(update);
        self.pending.push_back(field);
    }

    pub fn has_pending_validation(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Run the validations queued since the last tick, oldest first.
    /// Returns how many ran.
    pub fn tick(&mut self) -> usize {
        let mut ran = 0;
        while let Some(field) = self.pending.pop_front() {
            self.validate_field(field);
            ran += 1;
        }
        ran
    }

    /// Validate every field. Returns true when the form has no errors.
    pub fn validate_all(&mut self) -> bool {
        self.pending.clear();
        for field in FormField::ALL {
            self.validate_field(field);
        }
        self.errors.is_empty()
    }

    fn validate_field(&mut self, field: FormField) {
        match self.rules.check(field, &self.values) {
            Some(message) => {
                debug!(field = field.as_str(), reason = %message, "Field failed validation");
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }
}
