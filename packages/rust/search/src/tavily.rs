//! Tavily search API client.
//!
//! Posts queries to the Tavily `/search` endpoint and returns the raw JSON
//! payload. Non-JSON bodies are returned as a JSON string value so that
//! [`crate::normalize`] handles every response shape uniformly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use webscout_shared::{Result, WebScoutError};

use crate::{SearchMode, SearchProvider};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("WebScout/", env!("CARGO_PKG_VERSION"));

/// Request timeout for the search call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Token budget requested per search.
const MAX_TOKENS: u32 = 8000;

// ---------------------------------------------------------------------------
// TavilyClient
// ---------------------------------------------------------------------------

/// HTTP client for the Tavily search API.
pub struct TavilyClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

/// JSON body of a Tavily search request.
#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    include_answer: bool,
    include_domains: &'a [&'a str],
    exclude_domains: &'a [&'a str],
    max_tokens: u32,
}

impl TavilyClient {
    /// Create a client for the given API key and endpoint.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                WebScoutError::config(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    #[instrument(skip_all, fields(mode = mode.as_str()))]
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        include_answer: bool,
    ) -> Result<serde_json::Value> {
        let body = SearchBody {
            api_key: &self.api_key,
            query,
            search_depth: mode.as_str(),
            include_answer,
            include_domains: &[],
            exclude_domains: &[],
            max_tokens: MAX_TOKENS,
        };

        debug!(endpoint = %self.endpoint, "issuing search request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                WebScoutError::provider(
                    502,
                    format!("search request failed: {e}"),
                    serde_json::Value::Null,
                )
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            WebScoutError::provider(
                502,
                format!("failed to read search response body: {e}"),
                serde_json::Value::Null,
            )
        })?;

        // Keep whatever body the provider sent as diagnostic detail, parsed
        // when possible.
        let payload = serde_json::from_str::<serde_json::Value>(&text)
            .unwrap_or(serde_json::Value::String(text));

        if !status.is_success() {
            warn!(status = status.as_u16(), "search provider returned error status");
            return Err(WebScoutError::provider(
                status.as_u16(),
                provider_status_message(status.as_u16()),
                payload,
            ));
        }

        Ok(payload)
    }
}

/// Operator-readable message for a provider HTTP status.
pub fn provider_status_message(status: u16) -> String {
    match status {
        400 => "Bad request - Please check your query parameters".into(),
        401 => "Unauthorized - Invalid API key".into(),
        403 => "Forbidden - Please check your API permissions".into(),
        422 => "Unprocessable Entity - Invalid request format".into(),
        429 => "Too Many Requests - Rate limit exceeded".into(),
        500 => "Internal Server Error - Search provider is experiencing issues".into(),
        503 => "Service Unavailable - Search provider is temporarily unavailable".into(),
        other => format!("Unknown error occurred (Status: {other})"),
    }
}
