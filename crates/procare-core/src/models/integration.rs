use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A third-party integration connected to a business or user.
/// Owned by the business API; the client only lists and creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationOption {
    pub provider: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "is_authorized")]
    pub authorized: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IntegrationOption {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.provider)
    }
}
