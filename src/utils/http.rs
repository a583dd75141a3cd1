// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};

use crate::error::{AppError, Result};
use crate::models::ApiConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &ApiConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Map a non-success response to a typed error.
///
/// 429 becomes `RateLimited` carrying the `Retry-After` seconds, anything
/// else outside 2xx becomes `Status`.
pub fn check_status(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status.as_u16() == 429 {
        return Err(AppError::RateLimited {
            retry_after_secs: retry_after_secs(&response),
        });
    }
    Err(AppError::status(status.as_u16(), context))
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Fetch a URL and return its body bytes.
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = check_status(client.get(url).send().await?, url)?;
    Ok(response.bytes().await?.to_vec())
}
