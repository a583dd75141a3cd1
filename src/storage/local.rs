//! Local filesystem CSV output.
//!
//! Files are written whole to a temporary sibling and renamed into place, so
//! a reader never sees a half-written table.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::CardRecord;
use crate::storage::RecordSink;

/// File name of the all-years table.
pub const COMBINED_FILE: &str = "cards_all.csv";

/// CSV files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// File name for one year's table.
    pub fn year_file(year: u32) -> String {
        format!("cards_{year}.csv")
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("csv.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    /// Read a table back, `None` if the file doesn't exist.
    pub async fn read_records(&self, key: &str) -> Result<Option<Vec<CardRecord>>> {
        let bytes = match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Io(e)),
        };
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<CardRecord>, _>>()?;
        Ok(Some(records))
    }
}

/// Header row plus one row per record.
pub fn encode(records: &[CardRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CardRecord::HEADERS)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

#[async_trait]
impl RecordSink for LocalStorage {
    async fn write_year(&self, year: u32, records: &[CardRecord]) -> Result<PathBuf> {
        let path = self
            .write_bytes(&Self::year_file(year), &encode(records)?)
            .await?;
        log::info!("[{}] wrote {} records to {}", year, records.len(), path.display());
        Ok(path)
    }

    async fn write_combined(&self, records: &[CardRecord]) -> Result<PathBuf> {
        let path = self.write_bytes(COMBINED_FILE, &encode(records)?).await?;
        log::info!("Wrote {} combined records to {}", records.len(), path.display());
        Ok(path)
    }
}
