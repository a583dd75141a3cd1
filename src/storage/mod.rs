//! Output persistence for scraped records.
//!
//! ## Directory Structure
//!
//! ```text
//! {output_dir}/
//! ├── cards_1986.csv        # One file per completed year
//! ├── cards_1987.csv
//! ├── cards_all.csv         # Every completed year, ascending (optional)
//! └── images/               # Gallery images (optional)
//!     └── 1986/
//!         └── {player}_{card_no}_{grade}_{item_id}.jpg
//! ```

pub mod images;
pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CardRecord;

// Re-export for convenience
pub use images::ImageStore;
pub use local::LocalStorage;

/// Trait for record output backends.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist one year's records and return where they went.
    async fn write_year(&self, year: u32, records: &[CardRecord]) -> Result<PathBuf>;

    /// Persist the concatenation of several years.
    async fn write_combined(&self, records: &[CardRecord]) -> Result<PathBuf>;
}
