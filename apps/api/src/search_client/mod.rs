//! Search Client: web search and URL content extraction over the Tavily API.
//!
//! Same contract as `llm_client`: research tasks depend on the `WebSearch` and
//! `PageExtractor` traits, never on HTTP directly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::research::FailureKind;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
const TAVILY_EXTRACT_URL: &str = "https://api.tavily.com/extract";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("extraction failed for {url}: {reason}")]
    ExtractionFailed { url: String, reason: String },

    #[error("no search results for '{0}'")]
    NoResults(String),
}

impl SearchError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            SearchError::Http(e) if e.is_timeout() => FailureKind::Timeout,
            SearchError::Http(e) if e.is_decode() => FailureKind::MalformedResponse,
            SearchError::Http(_) => FailureKind::NetworkError,
            SearchError::Api { status: 429, .. } | SearchError::Api { status: 432, .. } => {
                FailureKind::QuotaExceeded
            }
            SearchError::Api { status, .. } if *status >= 500 => FailureKind::NetworkError,
            SearchError::Api { .. } => FailureKind::Unknown,
            SearchError::ExtractionFailed { .. } => FailureKind::NetworkError,
            SearchError::NoResults(_) => FailureKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Web-search capability.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError>;
}

/// Structured-extraction capability keyed by URL. `depth` is "basic" or "advanced".
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(&self, url: &str, depth: &str) -> Result<String, SearchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Tavily wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    urls: Vec<&'a str>,
    extract_depth: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    results: Vec<ExtractedPage>,
    #[serde(default)]
    failed_results: Vec<FailedExtraction>,
}

#[derive(Debug, Deserialize)]
struct ExtractedPage {
    raw_content: String,
}

#[derive(Debug, Deserialize)]
struct FailedExtraction {
    url: String,
    error: String,
}

impl ExtractResponse {
    /// Collapses the response into the page text for `url`; a listed failure wins.
    fn into_content(self, url: &str) -> Result<String, SearchError> {
        if let Some(failed) = self.failed_results.into_iter().next() {
            return Err(SearchError::ExtractionFailed {
                url: failed.url,
                reason: failed.error,
            });
        }
        self.results
            .into_iter()
            .map(|page| page.raw_content)
            .find(|content| !content.trim().is_empty())
            .ok_or_else(|| SearchError::ExtractionFailed {
                url: url.to_string(),
                reason: "page returned no content".to_string(),
            })
    }
}

/// Tavily client with the same retry policy as the LLM client.
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
}

impl TavilyClient {
    pub fn new(api_key: String) -> Result<Self, SearchError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()?,
            api_key,
        })
    }

    /// POSTs `body` to `url`, retrying on 429 and 5xx with exponential backoff.
    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, SearchError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let mut last_error: Option<SearchError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Tavily call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(SearchError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!("Tavily API returned {}: {}", status, message);
                last_error = Some(SearchError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(SearchError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response.json().await?);
        }

        Err(last_error.unwrap_or(SearchError::Api {
            status: 429,
            message: format!("rate limited after {MAX_RETRIES} retries"),
        }))
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError> {
        let request = SearchRequest {
            query,
            search_depth: "basic",
            max_results,
        };
        let response: SearchResponse = self.post_json(TAVILY_SEARCH_URL, &request).await?;
        debug!("Tavily search returned {} hits", response.results.len());

        if response.results.is_empty() {
            return Err(SearchError::NoResults(query.to_string()));
        }
        Ok(response.results)
    }
}

#[async_trait]
impl PageExtractor for TavilyClient {
    async fn extract(&self, url: &str, depth: &str) -> Result<String, SearchError> {
        let request = ExtractRequest {
            urls: vec![url],
            extract_depth: depth,
            format: "text",
        };
        let response: ExtractResponse = self.post_json(TAVILY_EXTRACT_URL, &request).await?;
        response.into_content(url)
    }
}
