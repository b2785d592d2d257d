//! Remote collaborators the setup screen talks to.
//!
//! `ApiClient` implements all three traits over HTTP; tests substitute
//! in-memory implementations.

use async_trait::async_trait;

use crate::api::ApiError;
use crate::models::{Account, Classroom, DataField, IntegrationOption, OptionItem, ProcareConfig, School};

/// Procare resources, looked up through the business API by account key (IKN).
#[async_trait]
pub trait ProcareSource: Send + Sync {
    async fn fetch_config(&self, ikn: &str) -> Result<ProcareConfig, ApiError>;

    async fn fetch_schools(&self, ikn: &str) -> Result<Vec<School>, ApiError>;

    async fn fetch_classrooms(&self, ikn: &str, school_id: &str) -> Result<Vec<Classroom>, ApiError>;

    async fn fetch_accounts(&self, ikn: &str, school_id: &str) -> Result<Vec<Account>, ApiError>;
}

/// Option sets owned by the local business system.
#[async_trait]
pub trait LocalOptionsSource: Send + Sync {
    async fn fetch_child_statuses(&self, business_id: &str, feature_id: &str) -> Result<Vec<OptionItem>, ApiError>;

    async fn fetch_custom_fields(&self, business_id: &str, feature_id: &str) -> Result<Vec<DataField>, ApiError>;

    async fn fetch_locations(&self, business_id: &str) -> Result<Vec<OptionItem>, ApiError>;
}

/// Storage for connected integrations, scoped either to a business or to the
/// signed-in user.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn list_business_integrations(&self, business_id: &str) -> Result<Vec<IntegrationOption>, ApiError>;

    async fn store_business_integration(
        &self,
        business_id: &str,
        provider: &str,
        code: &str,
    ) -> Result<IntegrationOption, ApiError>;

    async fn list_user_integrations(&self) -> Result<Vec<IntegrationOption>, ApiError>;

    async fn store_user_integration(&self, provider: &str, code: &str) -> Result<IntegrationOption, ApiError>;
}
