//! Service layer for the scraper.
//!
//! This module contains the business logic for:
//! - Title parsing (`TitleParser`)
//! - Finding API access (`SearchApi`, `FindingClient`)
//! - Retrying page fetches (`PageFetcher`)

mod fetcher;
mod finding;
mod parser;

pub use fetcher::PageFetcher;
pub use finding::{FindingClient, PageQuery, SearchApi, parse_response};
pub use parser::{ParsedTitle, TitleParser};
