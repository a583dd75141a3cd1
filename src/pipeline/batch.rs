// src/pipeline/batch.rs

//! Multi-year batch runs.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, CardRecord, Config};
use crate::pipeline::scrape::{ScrapeSettings, YearScraper};
use crate::services::{PageFetcher, SearchApi, TitleParser};
use crate::storage::{ImageStore, RecordSink};
use crate::utils::{RetryPolicy, Shutdown};

/// How one year ended.
#[derive(Debug)]
pub enum YearOutcome {
    /// All pages fetched. `path` is `None` when the year had no listings.
    Completed {
        year: u32,
        records: usize,
        path: Option<PathBuf>,
    },
    Failed { year: u32, error: AppError },
}

impl YearOutcome {
    pub fn year(&self) -> u32 {
        match self {
            Self::Completed { year, .. } | Self::Failed { year, .. } => *year,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Result of a batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// One entry per attempted year, ascending
    pub outcomes: Vec<YearOutcome>,
    pub combined_path: Option<PathBuf>,
    /// Stopped early by an operator interrupt
    pub interrupted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn completed(&self) -> impl Iterator<Item = &YearOutcome> {
        self.outcomes.iter().filter(|o| o.is_completed())
    }

    pub fn failed_years(&self) -> Vec<u32> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_completed())
            .map(YearOutcome::year)
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                YearOutcome::Completed { records, .. } => *records,
                YearOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// False only when an interrupt landed before any year completed.
    pub fn is_success(&self) -> bool {
        !self.interrupted || self.completed().next().is_some()
    }

    pub fn summary(&self) -> String {
        let elapsed = self.finished_at - self.started_at;
        let failed = self.failed_years();
        let mut line = format!(
            "{} years completed, {} records in {}s",
            self.completed().count(),
            self.total_records(),
            elapsed.num_seconds()
        );
        if !failed.is_empty() {
            let years: Vec<String> = failed.iter().map(u32::to_string).collect();
            line.push_str(&format!(", failed: {}", years.join(",")));
        }
        if self.interrupted {
            line.push_str(" (interrupted)");
        }
        line
    }
}

/// Runs the year scraper over a sequence of years.
pub struct BatchRunner {
    api_config: ApiConfig,
    fetcher: PageFetcher,
    parser: Arc<TitleParser>,
    settings: ScrapeSettings,
    sink: Arc<dyn RecordSink>,
    images: Option<ImageStore>,
    combined: bool,
    shutdown: Shutdown,
}

impl BatchRunner {
    pub fn new(
        config: &Config,
        api: Arc<dyn SearchApi>,
        sink: Arc<dyn RecordSink>,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let parser = TitleParser::new(&config.parsing)?;
        let policy = RetryPolicy::from_config(&config.scrape);

        Ok(Self {
            api_config: config.api.clone(),
            fetcher: PageFetcher::new(api, policy, shutdown.clone()),
            parser: Arc::new(parser),
            settings: ScrapeSettings::from_config(&config.scrape),
            sink,
            images: None,
            combined: config.output.combined,
            shutdown,
        })
    }

    /// Also download gallery images for completed years.
    pub fn with_images(mut self, images: ImageStore) -> Self {
        self.images = Some(images);
        self
    }

    pub fn year_scraper(&self, year: u32) -> YearScraper {
        YearScraper::new(
            year,
            self.api_config.keywords_for(year),
            self.fetcher.clone(),
            Arc::clone(&self.parser),
            self.settings,
            self.shutdown.clone(),
        )
    }

    /// Scrape each year in order.
    ///
    /// A failing year is recorded and skipped. Only a failed combined write
    /// fails the whole run.
    pub async fn run(&self, years: &[u32]) -> Result<BatchReport> {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(years.len());
        let mut combined: Vec<CardRecord> = Vec::new();
        let mut interrupted = false;

        log::info!("Scraping {} years", years.len());

        for (index, &year) in years.iter().enumerate() {
            if index > 0 && !self.shutdown.sleep(self.settings.delay).await {
                interrupted = true;
                break;
            }
            if self.shutdown.is_triggered() {
                interrupted = true;
                break;
            }

            log::info!("[{}] Starting", year);
            let result: Result<Vec<CardRecord>> =
                self.year_scraper(year).into_records().try_collect().await;

            let records = match result {
                Ok(records) => records,
                Err(AppError::Interrupted) => {
                    log::warn!("[{}] Interrupted, discarding partial results", year);
                    interrupted = true;
                    break;
                }
                Err(error) => {
                    log::error!("[{}] Failed: {}", year, error);
                    outcomes.push(YearOutcome::Failed { year, error });
                    continue;
                }
            };

            let outcome = self.finish_year(year, &records).await;
            if outcome.is_completed() && self.combined {
                combined.extend(records);
            }
            outcomes.push(outcome);
        }

        let combined_path = if self.combined && !combined.is_empty() {
            Some(self.sink.write_combined(&combined).await?)
        } else {
            None
        };

        let report = BatchReport {
            outcomes,
            combined_path,
            interrupted,
            started_at,
            finished_at: Utc::now(),
        };
        log::info!("Batch finished: {}", report.summary());
        Ok(report)
    }

    async fn finish_year(&self, year: u32, records: &[CardRecord]) -> YearOutcome {
        if records.is_empty() {
            log::warn!("[{}] No listings found", year);
            return YearOutcome::Completed {
                year,
                records: 0,
                path: None,
            };
        }

        let path = match self.sink.write_year(year, records).await {
            Ok(path) => path,
            Err(error) => {
                log::error!("[{}] Could not save records: {}", year, error);
                return YearOutcome::Failed { year, error };
            }
        };

        if let Some(images) = &self.images {
            let saved = images.download_all(records, &self.shutdown).await;
            log::info!("[{}] Saved {} images", year, saved);
        }

        YearOutcome::Completed {
            year,
            records: records.len(),
            path: Some(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::pipeline::scrape::tests::{FakeUpstream, Timed};
    use crate::storage::LocalStorage;
    use crate::storage::local::COMBINED_FILE;

    fn config(combined: bool) -> Config {
        let mut config = Config::default();
        config.scrape.request_delay_ms = 0;
        config.scrape.max_retries = 1;
        config.scrape.retry_base_delay_ms = 0;
        config.scrape.retry_max_delay_ms = 0;
        config.output.combined = combined;
        config
    }

    fn runner(
        upstream: FakeUpstream,
        storage: &LocalStorage,
        combined: bool,
    ) -> (BatchRunner, Arc<FakeUpstream>, Shutdown) {
        let api = Arc::new(upstream);
        let shutdown = Shutdown::new();
        let runner = BatchRunner::new(
            &config(combined),
            api.clone(),
            Arc::new(storage.clone()),
            shutdown.clone(),
        )
        .unwrap();
        (runner, api, shutdown)
    }

    #[tokio::test]
    async fn test_failed_year_is_isolated() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let years: Vec<u32> = (1980..=1985).collect();
        let mut upstream = FakeUpstream::new(years.iter().map(|&y| (y, 150)).collect());
        upstream.broken_years.push(1982);
        let (runner, api, _) = runner(upstream, &storage, false);

        let report = runner.run(&years).await.unwrap();

        assert_eq!(report.outcomes.len(), 6);
        assert_eq!(report.failed_years(), vec![1982]);
        assert_eq!(report.total_records(), 5 * 150);
        assert!(report.is_success());
        assert!(!tmp.path().join("cards_1982.csv").exists());
        for year in [1980, 1981, 1983, 1984, 1985] {
            let records = storage
                .read_records(&LocalStorage::year_file(year))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(records.len(), 150);
            assert!(records.iter().all(|r| r.year == year));
        }
        // 1982 used both attempts on page 1 only
        assert_eq!(api.requested_pages(1982), vec![1, 1]);
        assert!(report.combined_path.is_none());
    }

    #[tokio::test]
    async fn test_combined_matches_year_files() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let upstream = FakeUpstream::new(vec![(1993, 120), (1997, 40), (2001, 0)]);
        let (runner, _, _) = runner(upstream, &storage, true);

        let report = runner.run(&[1993, 1997, 2001]).await.unwrap();

        assert_eq!(report.completed().count(), 3);
        assert!(!tmp.path().join("cards_2001.csv").exists());
        assert_eq!(report.combined_path, Some(tmp.path().join(COMBINED_FILE)));

        let combined = storage.read_records(COMBINED_FILE).await.unwrap().unwrap();
        let mut expected = storage.read_records("cards_1993.csv").await.unwrap().unwrap();
        expected.extend(storage.read_records("cards_1997.csv").await.unwrap().unwrap());
        assert_eq!(combined.len(), 160);
        assert_eq!(combined, expected);
        assert!(combined.windows(2).all(|w| w[0].year <= w[1].year));
    }

    #[tokio::test]
    async fn test_combined_skips_failed_year() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let mut upstream = FakeUpstream::new(vec![(1980, 10), (1981, 10)]);
        upstream.broken_years.push(1981);
        let (runner, _, _) = runner(upstream, &storage, true);

        runner.run(&[1980, 1981]).await.unwrap();

        let combined = storage.read_records(COMBINED_FILE).await.unwrap().unwrap();
        assert_eq!(combined.len(), 10);
        assert!(combined.iter().all(|r| r.year == 1980));
    }

    #[tokio::test]
    async fn test_interrupt_before_start() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let (runner, api, shutdown) = runner(FakeUpstream::new(vec![(1986, 10)]), &storage, true);
        shutdown.trigger();

        let report = runner.run(&[1986, 1987]).await.unwrap();

        assert!(report.interrupted);
        assert!(!report.is_success());
        assert!(report.outcomes.is_empty());
        assert!(report.combined_path.is_none());
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_interrupt_keeps_completed_years() {
        /// Fires the interrupt once the second year is requested.
        struct StopOnSecondYear {
            inner: FakeUpstream,
            shutdown: Shutdown,
        }

        #[async_trait]
        impl SearchApi for StopOnSecondYear {
            async fn search(
                &self,
                query: &crate::services::PageQuery,
            ) -> Result<crate::models::SearchPage> {
                let page = self.inner.search(query).await;
                if query.cursor.year == 1987 {
                    self.shutdown.trigger();
                }
                page
            }
        }

        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let shutdown = Shutdown::new();
        let api = Arc::new(StopOnSecondYear {
            inner: FakeUpstream::new(vec![(1986, 30), (1987, 500), (1988, 30)]),
            shutdown: shutdown.clone(),
        });
        let runner =
            BatchRunner::new(&config(true), api, Arc::new(storage.clone()), shutdown).unwrap();

        let report = runner.run(&[1986, 1987, 1988]).await.unwrap();

        assert!(report.interrupted);
        assert!(report.is_success());
        assert_eq!(report.outcomes.len(), 1);
        assert!(!tmp.path().join("cards_1987.csv").exists());
        let combined = storage.read_records(COMBINED_FILE).await.unwrap().unwrap();
        assert_eq!(combined.len(), 30);
        assert!(report.summary().contains("(interrupted)"));
    }

    /// Keeps written years in memory.
    #[derive(Default)]
    struct MemorySink {
        years: Mutex<Vec<(u32, usize)>>,
    }

    #[async_trait]
    impl RecordSink for MemorySink {
        async fn write_year(&self, year: u32, records: &[CardRecord]) -> Result<PathBuf> {
            self.years.lock().unwrap().push((year, records.len()));
            Ok(PathBuf::from(format!("mem/{year}")))
        }

        async fn write_combined(&self, _records: &[CardRecord]) -> Result<PathBuf> {
            Ok(PathBuf::from("mem/all"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_pages_and_years() {
        let api = Arc::new(Timed::new(FakeUpstream::new(vec![(1980, 150), (1981, 50)])));
        let sink = Arc::new(MemorySink::default());
        let mut config = config(false);
        config.scrape.request_delay_ms = 300;
        let runner = BatchRunner::new(&config, api.clone(), sink.clone(), Shutdown::new()).unwrap();

        let report = runner.run(&[1980, 1981]).await.unwrap();

        assert_eq!(report.completed().count(), 2);
        assert_eq!(*sink.years.lock().unwrap(), vec![(1980, 150), (1981, 50)]);
        // 1980 page 1, 1980 page 2, then 1981 page 1 after the year gap
        assert_eq!(api.stamps_ms(), vec![0, 300, 600]);
    }

    #[tokio::test]
    async fn test_summary_lists_failures() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let mut upstream = FakeUpstream::new(vec![(1990, 5)]);
        upstream.broken_years.push(1991);
        let (runner, _, _) = runner(upstream, &storage, false);

        let report = runner.run(&[1990, 1991]).await.unwrap();
        let summary = report.summary();
        assert!(summary.starts_with("1 years completed, 5 records"));
        assert!(summary.ends_with("failed: 1991"));
    }
}
