//! Scraping pipeline.
//!
//! - `scrape`: Walk one year's result pages
//! - `batch`: Run many years and persist their output

pub mod batch;
pub mod scrape;

pub use batch::{BatchReport, BatchRunner, YearOutcome};
pub use scrape::{ScrapeSettings, ScrapeState, YearScraper};
