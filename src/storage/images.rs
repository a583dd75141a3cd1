//! Gallery image downloads.

use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::CardRecord;
use crate::utils::{Shutdown, http};

/// Saves gallery images under `{root}/{year}/`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    client: Client,
    root_dir: PathBuf,
}

impl ImageStore {
    pub fn new(client: Client, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Destination for a record's image.
    pub fn image_path(&self, record: &CardRecord) -> PathBuf {
        self.root_dir
            .join(record.year.to_string())
            .join(format!("{}.jpg", record.image_stem()))
    }

    /// Download one image. `Ok(None)` when the record has no gallery URL.
    pub async fn download(&self, record: &CardRecord) -> Result<Option<PathBuf>> {
        if record.gallery_url.trim().is_empty() {
            return Ok(None);
        }
        let bytes = http::fetch_bytes(&self.client, &record.gallery_url).await?;

        let path = self.image_path(record);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(Some(path))
    }

    /// Download every image in turn. Failures are logged and skipped.
    ///
    /// Returns the number of images saved.
    pub async fn download_all(&self, records: &[CardRecord], shutdown: &Shutdown) -> usize {
        let mut saved = 0;
        for record in records {
            if shutdown.is_triggered() {
                log::warn!("Image downloads interrupted after {} files", saved);
                break;
            }
            match self.download(record).await {
                Ok(Some(path)) => {
                    log::debug!("Saved {}", path.display());
                    saved += 1;
                }
                Ok(None) => {}
                Err(e) => log::warn!("Image for '{}' failed: {}", record.title, e),
            }
        }
        saved
    }
}
