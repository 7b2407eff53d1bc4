pub mod types;

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::history::{HistoryPage, HistorySource};
use types::{HealthStatus, PredictionDetail, PredictionInput, PredictionRecord, PredictionResult};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} reported failure: {message}")]
    Rejected { endpoint: String, message: String },
}

#[derive(Clone, Debug)]
pub struct ApiClientOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
}

impl Default for ApiClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_seconds: 10,
            proxy: None,
        }
    }
}

// Non-2xx responses carry a `{"detail": ...}` body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

// Envelope shared by the listing endpoints. A 2xx response with
// `success: false` is how the service reports database failures.
#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<PredictionRecord>,
    #[serde(default)]
    total_count: usize,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(options: ApiClientOptions) -> Result<Self, ApiError> {
        let base_url = options.base_url.trim().trim_end_matches('/').to_string();
        if reqwest::Url::parse(&base_url).is_err() {
            return Err(ApiError::InvalidBaseUrl {
                url: options.base_url,
            });
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "noshow/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(options.timeout_seconds.max(1)));
        if let Some(proxy_url) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| ApiError::ProxySetup {
                proxy: proxy_url.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::ClientBuild { source: e })?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn decode<T>(endpoint: String, response: reqwest::Response) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.detail,
                Err(_) => format!("HTTP error {status}"),
            };
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode { endpoint, source: e })
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let endpoint = self.endpoint(path);
        let response = self
            .http
            .get(&endpoint)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        Self::decode(endpoint, response).await
    }

    fn into_page(envelope: ListEnvelope, endpoint: &str) -> Result<HistoryPage, ApiError> {
        if !envelope.success {
            return Err(ApiError::Rejected {
                endpoint: endpoint.to_string(),
                message: envelope
                    .error
                    .unwrap_or_else(|| "unknown server error".to_string()),
            });
        }
        Ok(HistoryPage {
            records: envelope.data,
            total_count: envelope.total_count,
            has_more: envelope.has_more,
        })
    }

    /// One page of the recent-predictions listing.
    pub async fn recent(&self, skip: usize, limit: usize) -> Result<HistoryPage, ApiError> {
        let envelope: ListEnvelope = self
            .get_json(
                "predictions/recent",
                &[("skip", skip.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Self::into_page(envelope, "predictions/recent")
    }

    /// One page of the full listing, filtered by a name/risk search string.
    pub async fn search(
        &self,
        skip: usize,
        limit: usize,
        query: &str,
    ) -> Result<HistoryPage, ApiError> {
        let envelope: ListEnvelope = self
            .get_json(
                "predictions/all",
                &[
                    ("skip", skip.to_string()),
                    ("limit", limit.to_string()),
                    ("search", query.to_string()),
                ],
            )
            .await?;
        Self::into_page(envelope, "predictions/all")
    }

    /// Score a reservation and persist the prediction server-side.
    pub async fn submit(&self, input: &PredictionInput) -> Result<PredictionResult, ApiError> {
        let endpoint = self.endpoint("predict");
        let response = self
            .http
            .post(&endpoint)
            .json(input)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        Self::decode(endpoint, response).await
    }

    pub async fn prediction(&self, id: &str) -> Result<PredictionDetail, ApiError> {
        self.get_json(&format!("predictions/{id}"), &[]).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json("health", &[]).await
    }
}

impl HistorySource for ApiClient {
    async fn list_recent(&self, skip: usize, limit: usize) -> Result<HistoryPage, ApiError> {
        self.recent(skip, limit).await
    }
}

/// Pages through `predictions/all` with a fixed search string, so a search
/// view gets the same load-more semantics as the recent view.
#[derive(Clone, Debug)]
pub struct SearchSource {
    client: ApiClient,
    query: String,
}

impl SearchSource {
    pub fn new(client: ApiClient, query: String) -> Self {
        Self { client, query }
    }
}

impl HistorySource for SearchSource {
    async fn list_recent(&self, skip: usize, limit: usize) -> Result<HistoryPage, ApiError> {
        self.client.search(skip, limit, &self.query).await
    }
}
