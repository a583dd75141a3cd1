// src/pipeline/scrape.rs

//! Per-year pagination.
//!
//! A `YearScraper` walks one year's result pages as a small state machine:
//!
//! ```text
//! Fetching --more data--> Fetching
//! Fetching --short page | last page | page cap--> Done
//! Fetching --fatal fetch error--> Failed
//! Fetching --interrupt--> Interrupted
//! ```
//!
//! Each page is fully parsed before the next one is requested, and the
//! configured delay is slept before every page after the first.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{CardRecord, PageCursor, ScrapeConfig};
use crate::services::{PageFetcher, TitleParser};
use crate::utils::Shutdown;

/// Pagination and pacing for one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub page_size: u32,
    /// `None` streams until the upstream runs dry
    pub page_cap: Option<u32>,
    /// Wait between consecutive upstream requests
    pub delay: Duration,
}

impl ScrapeSettings {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            page_size: config.page_size,
            page_cap: config.page_cap(),
            delay: Duration::from_millis(config.request_delay_ms),
        }
    }
}

/// Where a year's run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    Fetching,
    Done,
    Failed,
    Interrupted,
}

/// Lazy, finite, non-restartable page walk for one year.
pub struct YearScraper {
    fetcher: PageFetcher,
    parser: Arc<TitleParser>,
    keywords: String,
    cursor: PageCursor,
    settings: ScrapeSettings,
    shutdown: Shutdown,
    state: ScrapeState,
}

impl YearScraper {
    pub fn new(
        year: u32,
        keywords: impl Into<String>,
        fetcher: PageFetcher,
        parser: Arc<TitleParser>,
        settings: ScrapeSettings,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            fetcher,
            parser,
            keywords: keywords.into(),
            cursor: PageCursor::first(year, settings.page_size),
            settings,
            shutdown,
            state: ScrapeState::Fetching,
        }
    }

    pub fn state(&self) -> ScrapeState {
        self.state
    }

    pub fn year(&self) -> u32 {
        self.cursor.year
    }

    /// Fetch and parse the next page.
    ///
    /// Returns `None` once the walk has ended. A `Some(Err(_))` is always the
    /// last item.
    pub async fn next_page(&mut self) -> Option<Result<Vec<CardRecord>>> {
        if self.state != ScrapeState::Fetching {
            return None;
        }

        if !self.cursor.is_first() && !self.shutdown.sleep(self.settings.delay).await {
            self.state = ScrapeState::Interrupted;
            return Some(Err(AppError::Interrupted));
        }

        let cursor = self.cursor;
        let page = match self.fetcher.fetch(&self.keywords, cursor).await {
            Ok(page) => page,
            Err(error) => {
                self.state = match error {
                    AppError::Interrupted => ScrapeState::Interrupted,
                    _ => ScrapeState::Failed,
                };
                return Some(Err(error));
            }
        };

        let short_page = page.len() < cursor.page_size as usize;
        let last_page = page.total_pages.is_some_and(|total| cursor.page >= total);
        let capped = self.settings.page_cap.is_some_and(|cap| cursor.page >= cap);

        log::info!(
            "[{}] page {}: {} items",
            cursor.year,
            cursor.page,
            page.len()
        );

        let records: Vec<CardRecord> = page
            .listings
            .into_iter()
            .map(|listing| {
                let parsed = self.parser.parse(&listing.title);
                CardRecord::from_listing(cursor.year, listing, parsed)
            })
            .collect();

        if short_page || last_page || capped {
            if capped && !short_page && !last_page {
                log::info!(
                    "[{}] page cap of {} reached",
                    cursor.year,
                    cursor.page
                );
            }
            self.state = ScrapeState::Done;
        } else {
            self.cursor = cursor.next();
        }

        Some(Ok(records))
    }

    /// One item per fetched page.
    pub fn into_pages(self) -> impl Stream<Item = Result<Vec<CardRecord>>> {
        stream::unfold(self, |mut scraper| async move {
            let page = scraper.next_page().await?;
            Some((page, scraper))
        })
    }

    /// One item per record, in upstream page order.
    pub fn into_records(self) -> impl Stream<Item = Result<CardRecord>> {
        self.into_pages().flat_map(|page| {
            let items: Vec<Result<CardRecord>> = match page {
                Ok(records) => records.into_iter().map(Ok).collect(),
                Err(error) => vec![Err(error)],
            };
            stream::iter(items)
        })
    }
}
