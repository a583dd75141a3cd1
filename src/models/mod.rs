// src/models/mod.rs

//! Domain models for the scraper.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod cursor;
mod listing;
mod record;
mod year_spec;

// Re-export all public types
pub use config::{ApiConfig, Config, MAX_PAGE_SIZE, OutputConfig, ParsingConfig, ScrapeConfig};
pub use cursor::PageCursor;
pub(crate) use listing::FindingEnvelope;
pub use listing::{ListingRecord, SearchPage};
pub use record::CardRecord;
pub use year_spec::YearSpec;
