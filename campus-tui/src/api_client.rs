//! REST client for the paged list endpoints.
//!
//! `RestClient` is the console's [`PageFetcher`]. Every response body is
//! validated against the page schema here, at the fetcher boundary. Network
//! failures are retried with jittered exponential backoff; server failures
//! are returned as is.

use crate::config::{AuthConfig, ConsoleConfig, RetryConfig};
use async_trait::async_trait;
use campus_core::{
    FetchError, ListEntity, Page, PageFetcher, PageRequest, PageResponse, SchemaViolation,
    PAGE_SCHEMA_VERSION,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Config error: {0}")]
    Config(String),
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    default_headers: HeaderMap,
    retry: RetryConfig,
}

impl RestClient {
    pub fn new(config: &ConsoleConfig) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let default_headers = build_default_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            default_headers,
            retry: config.retry.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_once<E: ListEntity>(&self, request: &PageRequest) -> Result<Page<E>, FetchError> {
        let url = format!("{}{}", self.base_url, request.path());
        let response = self
            .client
            .get(url)
            .headers(self.default_headers.clone())
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(classify_transport_error)?;
        if status.is_success() {
            decode_page_body(&body, request.page)
        } else {
            Err(decode_error_body(status.as_u16(), &body))
        }
    }
}

#[async_trait]
impl<E: ListEntity> PageFetcher<E> for RestClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<E>, FetchError> {
        let mut attempt = 0u32;
        let mut backoff = self.retry.initial_ms;
        loop {
            match self.fetch_once::<E>(request).await {
                Err(err) if err.is_retryable() && attempt < self.retry.attempts => {
                    attempt += 1;
                    let delay = jittered_backoff(backoff, self.retry.jitter_ms);
                    tracing::warn!(
                        collection = %request.collection,
                        page = request.page,
                        attempt,
                        delay_ms = delay,
                        error = %err,
                        "retrying page fetch"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    backoff = next_backoff(backoff, &self.retry);
                }
                result => return result,
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Decode and validate a 2xx body for `requested_page`.
pub fn decode_page_body<E: DeserializeOwned>(
    body: &[u8],
    requested_page: u32,
) -> Result<Page<E>, FetchError> {
    let response: PageResponse<E> = serde_json::from_slice(body)
        .map_err(|e| FetchError::from(SchemaViolation::Malformed(e.to_string())))?;
    Ok(Page::from_response(response, requested_page)?)
}

/// Build the error for a non-2xx response, preferring the body's `message`.
pub fn decode_error_body(status: u16, body: &[u8]) -> FetchError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));
    FetchError::server(Some(status), message)
}

fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_builder() {
        return FetchError::server(None, format!("Invalid request: {}", err));
    }
    FetchError::network(err.to_string())
}

fn next_backoff(current_ms: u64, retry: &RetryConfig) -> u64 {
    let next = (current_ms as f64 * retry.multiplier) as u64;
    next.min(retry.max_ms)
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    let jitter = nanos % jitter_ms;
    base_ms.saturating_add(jitter)
}

/// Header announcing the page schema version the client validates against.
pub const SCHEMA_VERSION_HEADER: &str = "x-page-schema-version";

fn build_default_headers(auth: &AuthConfig) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(SCHEMA_VERSION_HEADER),
        HeaderValue::from(PAGE_SCHEMA_VERSION),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("application/json"),
    );
    if let Some(api_key) = &auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    if let Some(jwt) = &auth.jwt {
        let value = format!("Bearer {}", jwt);
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
