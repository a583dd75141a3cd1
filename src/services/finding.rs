// src/services/finding.rs

//! Finding API client.
//!
//! One call is one request: no retries and no pacing here. `PageFetcher`
//! layers both on top of any `SearchApi`.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, FindingEnvelope, PageCursor, SearchPage};
use crate::utils::http;

/// Error id the Finding API uses when the call quota is exceeded.
const RATE_LIMIT_ERROR_ID: &str = "10001";

/// One search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub keywords: String,
    pub cursor: PageCursor,
}

/// A paginated listing search backend.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Issue a single request for one page.
    async fn search(&self, query: &PageQuery) -> Result<SearchPage>;
}

/// `findItemsByKeywords` over HTTP.
pub struct FindingClient {
    client: Client,
    endpoint: Url,
    app_id: String,
}

impl FindingClient {
    pub fn new(client: Client, config: &ApiConfig, app_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
            app_id: app_id.into(),
        })
    }

    /// Request URL for a query.
    pub fn request_url(&self, query: &PageQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("OPERATION-NAME", "findItemsByKeywords")
            .append_pair("SERVICE-VERSION", "1.0.0")
            .append_pair("SECURITY-APPNAME", &self.app_id)
            .append_pair("RESPONSE-DATA-FORMAT", "JSON")
            .append_pair("keywords", &query.keywords)
            .append_pair(
                "paginationInput.entriesPerPage",
                &query.cursor.page_size.to_string(),
            )
            .append_pair("paginationInput.pageNumber", &query.cursor.page.to_string())
            .append_pair("outputSelector", "PictureURLLarge");
        url
    }
}

#[async_trait]
impl SearchApi for FindingClient {
    async fn search(&self, query: &PageQuery) -> Result<SearchPage> {
        let context = format!(
            "search year {} page {}",
            query.cursor.year, query.cursor.page
        );
        let response = self.client.get(self.request_url(query)).send().await?;
        let body = http::check_status(response, &context)?.text().await?;
        parse_response(&body)
    }
}

/// Decode a Finding API JSON body into a page.
pub fn parse_response(body: &str) -> Result<SearchPage> {
    let envelope: FindingEnvelope = serde_json::from_str(body)?;
    let Some(response) = envelope.response.into_iter().next() else {
        return Ok(SearchPage::default());
    };

    if response.is_failure() {
        if response.errors().any(|e| e.error_id == RATE_LIMIT_ERROR_ID) {
            return Err(AppError::RateLimited {
                retry_after_secs: None,
            });
        }
        let message = response
            .errors()
            .map(|e| e.message.as_str())
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::Upstream(if message.is_empty() {
            "request failed without detail".to_string()
        } else {
            message
        }));
    }

    Ok(response.into_page())
}
