//! State behind the Procare integration setup screen.
//!
//! `ProcareSetup` loads Procare resources and local option sets, caches the
//! per-school classroom and account lists, and turns API failures into the
//! field errors the form displays.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::cache::ParentKeyedCache;
use crate::form::FormField;
use crate::models::{Account, Classroom, DataField, DataFieldName, LocalOptionSets, ProcareConfig, School};
use crate::source::{LocalOptionsSource, ProcareSource};

/// Shown on the IKN field when the API rejects it without a message.
pub const INVALID_IKN_MESSAGE: &str = "IKN is not valid";

/// Procare-side data loaded for the current IKN.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcareData {
    pub config: ProcareConfig,
    pub schools: Vec<School>,
}

/// The errored key that comes first on the form. Keys like `genders.boy`
/// rank by their leading field; keys the form doesn't know come last.
fn first_in_form_order<'a>(keys: impl Iterator<Item = &'a String>) -> Option<String> {
    keys.min_by_key(|key| {
        let field = key.split('.').next().unwrap_or(key);
        FormField::ALL
            .iter()
            .position(|f| f.as_str() == field)
            .unwrap_or(FormField::ALL.len())
    })
    .cloned()
}

/// Errors to show on the form, from both error shapes the API returns.
#[derive(Debug, Clone, Default)]
pub struct ErrorView {
    /// Field errors from a 422 response, every message per field
    server: BTreeMap<String, Vec<String>>,
    /// Errors the API did not report in field form
    custom: BTreeMap<String, String>,
    /// Field the screen should scroll to, once
    scroll_target: Option<String>,
}

impl ErrorView {
    /// One message per field: custom errors, overridden by server errors.
    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut merged = self.custom.clone();
        for (field, messages) in &self.server {
            if let Some(first) = messages.first() {
                merged.insert(field.clone(), first.clone());
            }
        }
        merged
    }

    pub fn clear(&mut self) {
        self.server.clear();
        self.custom.clear();
        self.scroll_target = None;
    }
}

pub struct ProcareSetup<S> {
    source: S,
    business_id: String,
    feature_id: String,
    procare: ProcareData,
    options: LocalOptionSets,
    classrooms: ParentKeyedCache<Classroom>,
    accounts: ParentKeyedCache<Account>,
    errors: ErrorView,
}

impl<S: ProcareSource + LocalOptionsSource> ProcareSetup<S> {
    pub fn new(source: S, business_id: impl Into<String>, feature_id: impl Into<String>) -> Self {
        Self {
            source,
            business_id: business_id.into(),
            feature_id: feature_id.into(),
            procare: ProcareData::default(),
            options: LocalOptionSets::default(),
            classrooms: ParentKeyedCache::new("classrooms"),
            accounts: ParentKeyedCache::new("accounts"),
            errors: ErrorView::default(),
        }
    }

    pub fn procare_data(&self) -> &ProcareData {
        &self.procare
    }

    /// Local option sets loaded so far, as passed to form import.
    pub fn option_sets(&self) -> &LocalOptionSets {
        &self.options
    }

    // ===== Procare Data =====

    /// Load configuration options and schools for an IKN.
    pub async fn load_procare_data(&mut self, ikn: &str) -> Result<(), ApiError> {
        self.procare.config = self.source.fetch_config(ikn).await?;
        self.procare.schools = self.source.fetch_schools(ikn).await?;
        info!(schools = self.procare.schools.len(), "Loaded Procare data");
        Ok(())
    }

    // ===== Local Option Sets =====

    pub async fn load_child_statuses(&mut self) -> Result<(), ApiError> {
        let statuses = self
            .source
            .fetch_child_statuses(&self.business_id, &self.feature_id)
            .await?;
        self.options.child_statuses = Some(statuses);
        Ok(())
    }

    /// Load relationship and gender options from the business custom fields.
    pub async fn load_data_fields(&mut self) -> Result<(), ApiError> {
        let fields = self
            .source
            .fetch_custom_fields(&self.business_id, &self.feature_id)
            .await?;
        self.apply_data_fields(&fields);
        Ok(())
    }

    pub async fn load_locations(&mut self) -> Result<(), ApiError> {
        let locations = self.source.fetch_locations(&self.business_id).await?;
        self.options.locations = Some(locations);
        Ok(())
    }

    /// Load every local option set. The three requests run concurrently and
    /// nothing is stored unless all of them succeed.
    pub async fn load_option_sets(&mut self) -> Result<(), ApiError> {
        let (statuses, fields, locations) = futures::try_join!(
            self.source.fetch_child_statuses(&self.business_id, &self.feature_id),
            self.source.fetch_custom_fields(&self.business_id, &self.feature_id),
            self.source.fetch_locations(&self.business_id),
        )?;
        self.options.child_statuses = Some(statuses);
        self.apply_data_fields(&fields);
        self.options.locations = Some(locations);
        Ok(())
    }

    fn apply_data_fields(&mut self, fields: &[DataField]) {
        self.options.relationships = Some(DataField::find_values(fields, DataFieldName::Relationship));
        self.options.genders = Some(DataField::find_values(fields, DataFieldName::Gender));
    }

    // ===== Per-School Resources =====

    pub async fn classrooms(&mut self, ikn: &str, school_id: &str) -> Result<Vec<Classroom>, ApiError> {
        let source = &self.source;
        self.classrooms
            .get_or_fetch(school_id, || source.fetch_classrooms(ikn, school_id))
            .await
    }

    /// Classroom lists currently shown, by school id.
    pub fn visible_classrooms(&self) -> &std::collections::HashMap<String, Vec<Classroom>> {
        self.classrooms.view()
    }

    pub fn remove_classroom(&mut self, school_id: &str) {
        self.classrooms.invalidate(school_id);
    }

    pub fn clear_classrooms_cache(&mut self) {
        self.classrooms.clear_all();
    }

    pub async fn accounts(&mut self, ikn: &str, school_id: &str) -> Result<Vec<Account>, ApiError> {
        let source = &self.source;
        self.accounts
            .get_or_fetch(school_id, || source.fetch_accounts(ikn, school_id))
            .await
    }

    /// Account lists currently shown, by school id.
    pub fn visible_accounts(&self) -> &std::collections::HashMap<String, Vec<Account>> {
        self.accounts.view()
    }

    pub fn remove_account(&mut self, school_id: &str) {
        self.accounts.invalidate(school_id);
    }

    pub fn clear_accounts_cache(&mut self) {
        self.accounts.clear_all();
    }

    // ===== Errors =====

    /// Record an API failure against the form.
    ///
    /// Validation failures fill the server errors and request a scroll to the
    /// first failing field. Bad requests put their message (or a fallback) on
    /// the IKN field. Anything else is handed back to the caller.
    pub fn handle_error(&mut self, err: ApiError) -> Result<(), ApiError> {
        match err {
            ApiError::Validation { message, errors } => {
                warn!(reason = %message, fields = errors.len(), "Settings rejected by server");
                if !errors.is_empty() {
                    self.errors.scroll_target = first_in_form_order(errors.keys());
                }
                self.errors.server = errors;
                Ok(())
            }
            ApiError::BadRequest { message } => {
                warn!(reason = ?message, "IKN rejected by server");
                let message = message.unwrap_or_else(|| INVALID_IKN_MESSAGE.to_string());
                self.errors.custom = BTreeMap::from([(FormField::Ikn.as_str().to_string(), message)]);
                Ok(())
            }
            other => Err(other),
        }
    }

    pub fn error_view(&self) -> &ErrorView {
        &self.errors
    }

    /// Unified field error view for the form.
    pub fn server_errors(&self) -> BTreeMap<String, String> {
        self.errors.merged()
    }

    /// Field to scroll to after a validation failure. Returned once.
    pub fn take_scroll_target(&mut self) -> Option<String> {
        let target = self.errors.scroll_target.take();
        if let Some(ref field) = target {
            debug!(field = %field, "Scrolling to first error");
        }
        target
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::models::{OptionItem, ProcareOption};

    #[derive(Default)]
    struct FakeSource {
        classroom_calls: AtomicUsize,
        account_calls: AtomicUsize,
        fail_locations: bool,
    }

    #[async_trait]
    impl ProcareSource for FakeSource {
        async fn fetch_config(&self, _ikn: &str) -> Result<ProcareConfig, ApiError> {
            Ok(ProcareConfig {
                phone_number_types: vec![ProcareOption { id: "1".into(), name: "Mobile".into() }],
                ..Default::default()
            })
        }

        async fn fetch_schools(&self, ikn: &str) -> Result<Vec<School>, ApiError> {
            if ikn == "bad" {
                return Err(ApiError::BadRequest { message: None });
            }
            Ok(vec![School::new("S1", "North"), School::new("S2", "South")])
        }

        async fn fetch_classrooms(&self, _ikn: &str, school_id: &str) -> Result<Vec<Classroom>, ApiError> {
            self.classroom_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Classroom::new(format!("{}-room", school_id), "Room")])
        }

        async fn fetch_accounts(&self, _ikn: &str, school_id: &str) -> Result<Vec<Account>, ApiError> {
            self.account_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Account::new(format!("{}-acct", school_id), "Account")])
        }
    }

    #[async_trait]
    impl LocalOptionsSource for FakeSource {
        async fn fetch_child_statuses(&self, _b: &str, _f: &str) -> Result<Vec<OptionItem>, ApiError> {
            Ok(vec![OptionItem::new("1", "Enrolled")])
        }

        async fn fetch_custom_fields(&self, _b: &str, _f: &str) -> Result<Vec<DataField>, ApiError> {
            Ok(vec![DataField {
                id: "9".into(),
                system_name: Some("gender".into()),
                input_values: Some(vec![OptionItem::new("1", "Boy")]),
            }])
        }

        async fn fetch_locations(&self, _b: &str) -> Result<Vec<OptionItem>, ApiError> {
            if self.fail_locations {
                return Err(ApiError::ServerError("down".into()));
            }
            Ok(vec![OptionItem::new("L1", "Main")])
        }
    }

    fn setup() -> ProcareSetup<FakeSource> {
        ProcareSetup::new(FakeSource::default(), "biz", "feat")
    }

    #[tokio::test]
    async fn test_load_procare_data() {
        let mut setup = setup();
        setup.load_procare_data("ikn").await.unwrap();
        assert_eq!(setup.procare_data().schools.len(), 2);
        assert_eq!(setup.procare_data().config.phone_number_types.len(), 1);
    }

    #[tokio::test]
    async fn test_load_data_fields_missing_relationship_is_empty() {
        let mut setup = setup();
        setup.load_data_fields().await.unwrap();
        assert_eq!(setup.option_sets().relationships, Some(vec![]));
        assert_eq!(setup.option_sets().genders, Some(vec![OptionItem::new("1", "Boy")]));
    }

    #[tokio::test]
    async fn test_load_option_sets_is_all_or_nothing() {
        let mut setup = setup();
        setup.load_option_sets().await.unwrap();
        assert!(setup.option_sets().child_statuses.is_some());
        assert!(setup.option_sets().locations.is_some());

        let mut failing = ProcareSetup::new(
            FakeSource { fail_locations: true, ..Default::default() },
            "biz",
            "feat",
        );
        assert!(failing.load_option_sets().await.is_err());
        assert!(failing.option_sets().child_statuses.is_none());
    }

    #[tokio::test]
    async fn test_load_individual_option_sets() {
        let mut setup = setup();
        setup.load_child_statuses().await.unwrap();
        setup.load_locations().await.unwrap();
        assert_eq!(setup.option_sets().child_statuses, Some(vec![OptionItem::new("1", "Enrolled")]));
        assert_eq!(setup.option_sets().locations, Some(vec![OptionItem::new("L1", "Main")]));
        assert!(setup.option_sets().relationships.is_none());
    }

    #[tokio::test]
    async fn test_classrooms_fetched_once_per_school() {
        let mut setup = setup();
        setup.classrooms("ikn", "S1").await.unwrap();
        setup.classrooms("ikn", "S1").await.unwrap();
        assert_eq!(setup.source.classroom_calls.load(Ordering::SeqCst), 1);

        setup.clear_classrooms_cache();
        setup.classrooms("ikn", "S1").await.unwrap();
        assert_eq!(setup.source.classroom_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_remove_classroom_does_not_refetch() {
        let mut setup = setup();
        setup.classrooms("ikn", "S1").await.unwrap();
        setup.remove_classroom("S1");
        assert!(setup.visible_classrooms().is_empty());

        let rooms = setup.classrooms("ikn", "S1").await.unwrap();
        assert_eq!(rooms[0].id, "S1-room");
        assert_eq!(setup.source.classroom_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_accounts_cache_is_separate() {
        let mut setup = setup();
        let accounts = setup.accounts("ikn", "S1").await.unwrap();
        assert_eq!(accounts[0].id, "S1-acct");
        setup.classrooms("ikn", "S1").await.unwrap();
        setup.clear_accounts_cache();
        setup.remove_account("S1");
        setup.classrooms("ikn", "S1").await.unwrap();
        setup.accounts("ikn", "S1").await.unwrap();

        assert_eq!(setup.source.classroom_calls.load(Ordering::SeqCst), 1);
        assert_eq!(setup.source.account_calls.load(Ordering::SeqCst), 2);
        assert_eq!(setup.visible_accounts().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_request_maps_to_ikn_with_fallback() {
        let mut setup = setup();
        let err = setup.load_procare_data("bad").await.unwrap_err();
        setup.handle_error(err).unwrap();
        assert_eq!(setup.server_errors().get("ikn").map(String::as_str), Some(INVALID_IKN_MESSAGE));
        assert_eq!(setup.take_scroll_target(), None);
    }

    #[test]
    fn test_bad_request_keeps_server_message() {
        let mut setup = setup();
        setup
            .handle_error(ApiError::BadRequest { message: Some("Unknown IKN".into()) })
            .unwrap();
        assert_eq!(setup.server_errors()["ikn"], "Unknown IKN");
    }

    #[test]
    fn test_validation_errors_are_merged_and_scrolled() {
        let mut setup = setup();
        setup
            .handle_error(ApiError::BadRequest { message: Some("old".into()) })
            .unwrap();
        let errors = BTreeMap::from([
            ("ikn".to_string(), vec!["taken".to_string(), "second".to_string()]),
            ("sync_time".to_string(), vec!["invalid".to_string()]),
        ]);
        setup
            .handle_error(ApiError::Validation { message: "Invalid".into(), errors })
            .unwrap();

        let view = setup.server_errors();
        assert_eq!(view["ikn"], "taken");
        assert_eq!(view["sync_time"], "invalid");
        assert_eq!(setup.take_scroll_target().as_deref(), Some("ikn"));
        assert_eq!(setup.take_scroll_target(), None);

        setup.clear_errors();
        assert!(setup.error_view().merged().is_empty());
    }

    #[test]
    fn test_scroll_target_follows_form_order() {
        let mut setup = setup();
        let errors = BTreeMap::from([
            ("sync_time".to_string(), vec!["invalid".to_string()]),
            ("consent".to_string(), vec!["required".to_string()]),
            ("genders.boy".to_string(), vec!["unknown".to_string()]),
            ("alpha".to_string(), vec!["unexpected".to_string()]),
        ]);
        setup
            .handle_error(ApiError::Validation { message: "Invalid".into(), errors })
            .unwrap();
        assert_eq!(setup.take_scroll_target().as_deref(), Some("consent"));

        let errors = BTreeMap::from([
            ("genders.boy".to_string(), vec!["unknown".to_string()]),
            ("alpha".to_string(), vec!["unexpected".to_string()]),
            ("zeta".to_string(), vec!["unexpected".to_string()]),
        ]);
        setup
            .handle_error(ApiError::Validation { message: "Invalid".into(), errors })
            .unwrap();
        assert_eq!(setup.take_scroll_target().as_deref(), Some("genders.boy"));

        let errors = BTreeMap::from([
            ("zeta".to_string(), vec!["unexpected".to_string()]),
            ("alpha".to_string(), vec!["unexpected".to_string()]),
        ]);
        setup
            .handle_error(ApiError::Validation { message: "Invalid".into(), errors })
            .unwrap();
        assert_eq!(setup.take_scroll_target().as_deref(), Some("alpha"));
    }

    #[test]
    fn test_other_errors_are_returned() {
        let mut setup = setup();
        let err = setup.handle_error(ApiError::Unauthorized).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(setup.server_errors().is_empty());
    }
}
