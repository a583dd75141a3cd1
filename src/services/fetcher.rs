// src/services/fetcher.rs

//! Page fetching with bounded retry.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{PageCursor, SearchPage};
use crate::services::{PageQuery, SearchApi};
use crate::utils::{RetryPolicy, Shutdown};

/// Fetches single pages, retrying transient failures.
#[derive(Clone)]
pub struct PageFetcher {
    api: Arc<dyn SearchApi>,
    policy: RetryPolicy,
    shutdown: Shutdown,
}

impl PageFetcher {
    pub fn new(api: Arc<dyn SearchApi>, policy: RetryPolicy, shutdown: Shutdown) -> Self {
        Self {
            api,
            policy,
            shutdown,
        }
    }

    /// Fetch one page.
    ///
    /// Transient errors are retried with backoff until the policy is spent,
    /// then surface as `RetriesExhausted`. Other errors return at once. An
    /// interrupt before an attempt or during a backoff wait returns
    /// `Interrupted`.
    pub async fn fetch(&self, keywords: &str, cursor: PageCursor) -> Result<SearchPage> {
        let query = PageQuery {
            keywords: keywords.to_string(),
            cursor,
        };
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            if self.shutdown.is_triggered() {
                return Err(AppError::Interrupted);
            }
            attempt += 1;

            let error = match self.api.search(&query).await {
                Ok(page) => {
                    log::debug!(
                        "Year {} page {}: {} listings (attempt {})",
                        cursor.year,
                        cursor.page,
                        page.len(),
                        attempt
                    );
                    return Ok(page);
                }
                Err(e) => e,
            };

            if !error.is_transient() {
                log::error!(
                    "Year {} page {}: {}",
                    cursor.year,
                    cursor.page,
                    error
                );
                return Err(error);
            }
            if attempt >= max_attempts {
                return Err(AppError::RetriesExhausted {
                    year: cursor.year,
                    page: cursor.page,
                    attempts: attempt,
                    source: Box::new(error),
                });
            }

            let delay = self.policy.delay_for(attempt - 1, &error);
            log::warn!(
                "Year {} page {}: {} (attempt {}/{}), retrying in {:?}",
                cursor.year,
                cursor.page,
                error,
                attempt,
                max_attempts,
                delay
            );
            if !self.shutdown.sleep(delay).await {
                return Err(AppError::Interrupted);
            }
        }
    }
}
