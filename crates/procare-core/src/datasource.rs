//! Routes integration listing and creation to business or user storage.

use crate::api::ApiError;
use crate::models::IntegrationOption;
use crate::source::IntegrationStore;

/// Which integration storage a data source talks to. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageScope {
    Business { business_id: String },
    User,
}

impl StorageScope {
    /// Business scope when `is_business` is set, user scope otherwise.
    pub fn from_flag(is_business: bool, business_id: impl Into<String>) -> Self {
        if is_business {
            StorageScope::Business {
                business_id: business_id.into(),
            }
        } else {
            StorageScope::User
        }
    }
}

pub struct IntegrationDataSource<S> {
    store: S,
    scope: StorageScope,
}

impl<S: IntegrationStore> IntegrationDataSource<S> {
    pub fn new(store: S, scope: StorageScope) -> Self {
        Self { store, scope }
    }

    pub fn scope(&self) -> &StorageScope {
        &self.scope
    }

    pub async fn list(&self) -> Result<Vec<IntegrationOption>, ApiError> {
        match &self.scope {
            StorageScope::Business { business_id } => self.store.list_business_integrations(business_id).await,
            StorageScope::User => self.store.list_user_integrations().await,
        }
    }

    pub async fn store(&self, provider: &str, code: &str) -> Result<IntegrationOption, ApiError> {
        match &self.scope {
            StorageScope::Business { business_id } => {
                self.store
                    .store_business_integration(business_id, provider, code)
                    .await
            }
            StorageScope::User => self.store.store_user_integration(provider, code).await,
        }
    }
}
