//! API client for the business REST API.
//!
//! Every endpoint wraps its payload in a `{ "data": ... }` envelope, which
//! the request helpers strip before handing results back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{
    Account, Classroom, DataEnvelope, DataField, IntegrationOption, OptionItem, ProcareConfig,
    School,
};
use crate::source::{IntegrationStore, LocalOptionsSource, ProcareSource};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the business API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    initial_backoff: Duration,
}

#[derive(Serialize)]
struct StoreIntegrationBody<'a> {
    provider: &'a str,
    code: &'a str,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Set the first delay used when backing off from a 429. Doubles per retry.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
            initial_backoff: self.initial_backoff,
        }
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidResponse("Bearer token contains invalid characters".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_envelope<T: DeserializeOwned>(response: reqwest::Response, url: &Url) -> Result<T, ApiError> {
        let text = response.text().await?;
        let envelope: DataEnvelope<T> = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e)))?;
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            debug!(url = %url, "GET");
            let response = self
                .client
                .get(url.clone())
                .headers(self.auth_headers()?)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Self::parse_envelope(response, &url).await,
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(&self, url: Url, body: &B) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            debug!(url = %url, "POST");
            let response = self
                .client
                .post(url.clone())
                .headers(self.auth_headers()?)
                .json(body)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Self::parse_envelope(response, &url).await,
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
}

// ===== Procare Resources =====

#[async_trait]
impl ProcareSource for ApiClient {
    async fn fetch_config(&self, ikn: &str) -> Result<ProcareConfig, ApiError> {
        self.get(self.url(&["integrations", "procare", ikn, "config"])?).await
    }

    async fn fetch_schools(&self, ikn: &str) -> Result<Vec<School>, ApiError> {
        self.get(self.url(&["integrations", "procare", ikn, "schools"])?).await
    }

    async fn fetch_classrooms(&self, ikn: &str, school_id: &str) -> Result<Vec<Classroom>, ApiError> {
        self.get(self.url(&["integrations", "procare", ikn, "schools", school_id, "classrooms"])?)
            .await
    }

    async fn fetch_accounts(&self, ikn: &str, school_id: &str) -> Result<Vec<Account>, ApiError> {
        self.get(self.url(&["integrations", "procare", ikn, "schools", school_id, "accounts"])?)
            .await
    }
}

// ===== Local Option Sets =====

#[async_trait]
impl LocalOptionsSource for ApiClient {
    async fn fetch_child_statuses(&self, business_id: &str, feature_id: &str) -> Result<Vec<OptionItem>, ApiError> {
        self.get(self.url(&["business", business_id, "features", feature_id, "child-statuses"])?)
            .await
    }

    async fn fetch_custom_fields(&self, business_id: &str, feature_id: &str) -> Result<Vec<DataField>, ApiError> {
        self.get(self.url(&["business", business_id, "features", feature_id, "fields"])?)
            .await
    }

    async fn fetch_locations(&self, business_id: &str) -> Result<Vec<OptionItem>, ApiError> {
        self.get(self.url(&["business", business_id, "locations"])?).await
    }
}

// ===== Integration Storage =====

#[async_trait]
impl IntegrationStore for ApiClient {
    async fn list_business_integrations(&self, business_id: &str) -> Result<Vec<IntegrationOption>, ApiError> {
        self.get(self.url(&["business", business_id, "integrations"])?).await
    }

    async fn store_business_integration(
        &self,
        business_id: &str,
        provider: &str,
        code: &str,
    ) -> Result<IntegrationOption, ApiError> {
        let body = StoreIntegrationBody { provider, code };
        self.post(self.url(&["business", business_id, "integrations"])?, &body).await
    }

    async fn list_user_integrations(&self) -> Result<Vec<IntegrationOption>, ApiError> {
        self.get(self.url(&["user", "integrations"])?).await
    }

    async fn store_user_integration(&self, provider: &str, code: &str) -> Result<IntegrationOption, ApiError> {
        let body = StoreIntegrationBody { provider, code };
        self.post(self.url(&["user", "integrations"])?, &body).await
    }
}
