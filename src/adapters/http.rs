use crate::domain::model::{ApiStatus, PageRequest, SearchPage};
use crate::domain::ports::{ConfigProvider, NoticeSource};
use crate::utils::error::{RequestTarget, Result, TedError};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.ted.europa.eu";
pub const SEARCH_PATH: &str = "/v3/notices/search";
pub const DEFAULT_HEALTH_PATH: &str = "/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keys the health endpoint may use for its latest supported API version.
const VERSION_KEYS: &[&str] = &[
    "latestSupportedVersion",
    "latest-supported-version",
    "latestVersion",
    "version",
];

/// How much of an error body ends up in the error message.
const ERROR_BODY_PREVIEW: usize = 500;

/// Anonymous client for the TED search API.
#[derive(Debug, Clone)]
pub struct TedClient {
    client: Client,
    base_url: String,
    health_path: String,
}

impl TedClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ted-search/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TedError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Ok(Self::new(config.base_url(), config.request_timeout())?
            .with_health_path(config.health_path()))
    }

    pub fn with_health_path(mut self, path: &str) -> Self {
        self.health_path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        self
    }

    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url, SEARCH_PATH)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, self.health_path)
    }

    /// Underlying HTTP client, shared with the document downloader.
    pub fn http_client(&self) -> Client {
        self.client.clone()
    }

    /// Confirms the API answers and reads its advertised version.
    pub async fn check_health(&self) -> Result<ApiStatus> {
        let endpoint = self.health_url();
        tracing::debug!("Health check: GET {}", endpoint);

        let response = self.client.get(&endpoint).send().await.map_err(|source| {
            TedError::TransportError {
                target: RequestTarget::Health,
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TedError::ApiError {
                target: RequestTarget::Health,
                status: Some(status.as_u16()),
                message: format!("HTTP {}: {}", status, preview(&body)),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| TedError::TransportError {
                target: RequestTarget::Health,
                source,
            })?;
        let metadata: Value =
            serde_json::from_slice(&bytes).map_err(|e| TedError::ApiError {
                target: RequestTarget::Health,
                status: Some(status.as_u16()),
                message: format!("Response is not JSON: {}", e),
            })?;

        Ok(ApiStatus {
            endpoint,
            latest_supported_version: latest_version(&metadata),
            metadata,
        })
    }
}

#[async_trait::async_trait]
impl NoticeSource for TedClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<SearchPage> {
        let target = RequestTarget::Page(request.page);
        let url = self.search_url();
        tracing::debug!(
            "POST {} page={} limit={} fields={:?}",
            url,
            request.page,
            request.limit,
            request.fields
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| TedError::TransportError {
                target: target.clone(),
                source,
            })?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TedError::ApiError {
                target,
                status: Some(status.as_u16()),
                message: format!("HTTP {}: {}", status, preview(&body)),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| TedError::TransportError {
                target: target.clone(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|e| TedError::ApiError {
            target,
            status: Some(status.as_u16()),
            message: format!("Malformed response body: {}", e),
        })
    }
}

fn latest_version(metadata: &Value) -> Option<String> {
    let object = metadata.as_object()?;
    VERSION_KEYS
        .iter()
        .find_map(|key| match object.get(*key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > ERROR_BODY_PREVIEW {
        let cut: String = trimmed.chars().take(ERROR_BODY_PREVIEW).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}
