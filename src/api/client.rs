//! API client for the WaniKani v2 REST API.
//!
//! Collection endpoints are paginated; [`ApiClient::fetch`] follows
//! `pages.next_url` page by page and exposes the records of a whole
//! collection as one lazy, single-pass stream.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::models::{Category, Collection, Resource};
use crate::sync::RecordSource;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the WaniKani v2 API
const API_BASE_URL: &str = "https://api.wanikani.com/v2";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while still failing fast.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
/// WaniKani allows 60 requests per minute; 3 retries with exponential
/// backoff usually clears the window.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for WaniKani.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_key: String,
}

impl ApiClient {
    /// Create a new API client authenticating with the given API key
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, api_key })
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get_collection(&self, url: &str) -> Result<Collection> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url)
                .headers(self.auth_headers()?)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse collection page from {}", url));
                }
                None => {
                    // Rate limited
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    /// URL of the first collection page for a category, bounded by an
    /// optional "updated after" timestamp. No bound means full history.
    fn collection_url(&self, category: Category, updated_after: Option<DateTime<Utc>>) -> String {
        let mut url = format!("{}/{}", API_BASE_URL, category.endpoint());
        if let Some(ts) = updated_after {
            url.push_str(&format!(
                "?updated_after={}",
                ts.to_rfc3339_opts(SecondsFormat::Micros, true)
            ));
        }
        url
    }

    /// Stream every record of a category updated strictly after
    /// `updated_after` (or all records when `None`).
    ///
    /// Pages are fetched lazily as the stream is polled; the stream is
    /// single-pass and not restartable, since it reflects a live paginated
    /// fetch. Any page failure ends the stream with that error.
    pub fn fetch(
        &self,
        category: Category,
        updated_after: Option<DateTime<Utc>>,
    ) -> BoxStream<'static, Result<Resource>> {
        let client = self.clone();
        let first_url = self.collection_url(category, updated_after);

        stream::try_unfold(Some(first_url), move |next_url| {
            let client = client.clone();
            async move {
                let Some(url) = next_url else {
                    return Ok::<_, anyhow::Error>(None);
                };

                let page: Collection = client.get_collection(&url).await?;
                debug!(
                    category = %category,
                    records = page.data.len(),
                    total = page.total_count,
                    "Fetched collection page"
                );

                let records = stream::iter(page.data.into_iter().map(Ok));
                Ok(Some((records, page.pages.next_url)))
            }
        })
        .try_flatten()
        .boxed()
    }
}

impl RecordSource for ApiClient {
    fn fetch(
        &self,
        category: Category,
        updated_after: Option<DateTime<Utc>>,
    ) -> BoxStream<'static, Result<Resource>> {
        ApiClient::fetch(self, category, updated_after)
    }
}

// ============================================================================
// Tests
// ============================================================================
